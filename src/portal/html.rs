//! 内嵌 HTML 静态资源

const STYLE: &str = r#"<style>
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            background: #1a1a2e;
            color: #eee;
            min-height: 100vh;
            padding: 20px;
            text-align: center;
        }
        .container { max-width: 400px; margin: 0 auto; }
        h1 { margin: 24px 0; font-size: 24px; color: #00d4ff; }
        p { margin-bottom: 16px; color: #aaa; }
        .ticket { font-size: 96px; font-weight: bold; color: #00d4ff; margin: 24px 0; }
        button {
            width: 100%;
            padding: 14px;
            border: none;
            border-radius: 8px;
            font-size: 18px;
            min-height: 48px;
            background: #00d4ff;
            color: #1a1a2e;
            font-weight: bold;
            cursor: pointer;
        }
        a { color: #00d4ff; }
    </style>"#;

/// `/poll` 轮询脚本，`{on_in_queue}` 决定收到 IN_QUEUE 时的动作
const POLL_SCRIPT: &str = r#"<script>
        function pollServer() {
            fetch('/poll', { cache: 'no-store' })
                .then(resp => resp.text())
                .then(data => {
                    if (data === 'PROCEED') {
                        window.location.href = '/proceed';
                        return;
                    }
                    if (data === 'IN_QUEUE') {
                        {on_in_queue}
                    }
                    setTimeout(pollServer, 2000);
                })
                .catch(e => {
                    console.error('Error polling:', e);
                    setTimeout(pollServer, 5000);
                });
        }
        window.onload = pollServer;
    </script>"#;

const INDEX_BODY: &str = r#"<div class="container">
        <h1>Welcome</h1>
        <p>Take a ticket and we will call you when it is your turn.</p>
        <form action="/join_queue" method="get">
            <button type="submit">Join Queue</button>
        </form>
    </div>"#;

const QUEUE_BODY: &str = r#"<div class="container">
        <h1>You are in the queue</h1>
        <p>Your number</p>
        <div class="ticket">{ticket}</div>
        <p>Waiting for your turn... keep this page open.</p>
    </div>"#;

const NO_TICKET_BODY: &str = r#"<div class="container">
        <h1>No ticket</h1>
        <p>You do not hold a ticket yet.</p>
        <p><a href="/">Back to start</a></p>
    </div>"#;

const PROCEED_BODY: &str = r#"<div class="container">
        <h1>It's your turn!</h1>
        <p>You can now proceed.</p>
    </div>
    <script>
        window.onload = function () {
            var audioCtx = new (window.AudioContext || window.webkitAudioContext)();
            function beep(frequency, duration, volume, callback) {
                var oscillator = audioCtx.createOscillator();
                var gainNode = audioCtx.createGain();
                oscillator.connect(gainNode);
                gainNode.connect(audioCtx.destination);
                gainNode.gain.value = volume;
                oscillator.frequency.value = frequency;
                oscillator.type = 'sine';
                oscillator.onended = callback;
                oscillator.start();
                setTimeout(function () { oscillator.stop(); }, duration);
            }
            function playBeepLoop() {
                beep(880, 500, 0.1, function () {
                    setTimeout(playBeepLoop, 300);
                });
            }
            playBeepLoop();
        };
    </script>"#;

fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    {STYLE}
    {head_extra}
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// 落地页：已在队列中的访客会被带到 `/queue`
pub fn index() -> String {
    let script = POLL_SCRIPT.replace("{on_in_queue}", "window.location.href = '/queue'; return;");
    page("Queue", &script, INDEX_BODY)
}

pub fn queue(ticket: Option<u8>) -> String {
    match ticket {
        Some(ticket) => {
            let script = POLL_SCRIPT.replace("{on_in_queue}", "");
            page(
                "Your ticket",
                &script,
                &QUEUE_BODY.replace("{ticket}", &ticket.to_string()),
            )
        }
        None => page("No ticket", "", NO_TICKET_BODY),
    }
}

pub fn proceed() -> String {
    page("Proceed", "", PROCEED_BODY)
}
