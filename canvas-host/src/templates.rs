// canvas-host/src/templates.rs
use canvas_core::ContextPayload;

/// Escape a value for interpolation into HTML text or attribute positions.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// The page returned to the host platform: an iframe loading the embedded
/// app with the signed token, plus a postMessage listener whose origin check
/// compares against the configured expected origin (never a value echoed
/// straight from the request).
pub fn embed_page(token: &str, app_path: &str, expected_origin: &str) -> String {
    let token = escape_html(token);
    let app_path = escape_html(app_path);
    let expected_origin = escape_html(expected_origin);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Canvas Host</title>
    <style>
        body {{ margin: 0; padding: 0; font-family: sans-serif; }}
        iframe {{
            width: 100%;
            height: 100vh;
            border: none;
            display: block;
        }}
    </style>
</head>
<body>
    <iframe src="{app_path}?signed_request={token}"></iframe>
    <script>
      window.addEventListener('message', (event) => {{
        if (event.origin !== "{expected_origin}") {{
          return;
        }}
        console.log('Received message from canvas app:', event.data);
      }}, false);
    </script>
</body>
</html>
"#
    )
}

/// The embedded-app page served after the gate authorizes a request. Renders
/// the verified context only; the raw token is never written back out.
pub fn app_page(payload: &ContextPayload) -> String {
    let subject = escape_html(&payload.sub);
    let org = escape_html(&payload.org);

    let params = if payload.params.is_empty() {
        String::new()
    } else {
        let rows: String = payload
            .params
            .iter()
            .map(|(key, value)| {
                format!(
                    "<li><strong>{}</strong>: {}</li>",
                    escape_html(key),
                    escape_html(value)
                )
            })
            .collect();
        format!("<ul class=\"params\">{rows}</ul>")
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Hello from Canvas App</title>
    <style>
        body {{
            font-family: 'Arial', sans-serif;
            background-color: #f4f4f4;
            margin: 0;
            padding: 0;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
        }}
        .container {{
            background-color: #fff;
            padding: 20px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
            text-align: center;
        }}
        h1 {{ color: #0078d7; margin-bottom: 20px; }}
        p {{ color: #333; font-size: 1.1em; margin-bottom: 10px; }}
        .params {{ text-align: left; display: inline-block; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Hello, {subject}!</h1>
        <p>Verified context for organization <strong>{org}</strong>.</p>
        {params}
    </div>
</body>
</html>
"#
    )
}
