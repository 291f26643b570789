use crate::models::CopyTarget;
use crate::services::session::SessionView;
use html_escape::{encode_double_quoted_attribute, encode_text};

pub const EXAMPLE_THEMES: [&str; 4] = [
    "Um astronauta descobrindo um oásis alienígena brilhante",
    "Um detetive neon-noir em uma cidade chuvosa do futuro",
    "Uma floresta mágica com animais feitos de luz estelar",
    "Corrida de carros voadores por cânions de Marte",
];

pub fn index_page() -> String {
    let examples: String = EXAMPLE_THEMES
        .iter()
        .map(|theme| {
            format!(
                r#"<button type="button" class="example" data-theme="{}">{}</button>"#,
                encode_double_quoted_attribute(theme),
                encode_text(theme)
            )
        })
        .collect();

    // A JSON string is a valid JavaScript string literal.
    let failure_banner =
        serde_json::to_string(&banner(REQUEST_FAILED_MESSAGE)).unwrap_or_else(|_| "''".to_string());

    INDEX_HTML
        .replace("{{EXAMPLES}}", &examples)
        .replace("{{FAILURE_BANNER}}", &failure_banner)
}

/// Shown by the page when the server cannot be reached or answers with an error.
pub const REQUEST_FAILED_MESSAGE: &str =
    "Erro ao gerar prompts: não foi possível obter uma resposta do servidor.";

fn banner(message: &str) -> String {
    format!(
        r#"<div class="banner" role="alert"><p>{}</p></div>"#,
        encode_text(message)
    )
}

/// Result area: error banner, then loader, then the panels. Panels are only
/// shown when a result is present and no generation is pending.
pub fn render_result(view: &SessionView) -> String {
    let mut html = String::new();

    if let Some(error) = &view.state.error {
        html.push_str(&banner(error));
    }

    if view.state.is_loading {
        html.push_str(r#"<div class="loader" aria-busy="true">Gerando prompts...</div>"#);
    }

    if let (Some(prompts), false) = (&view.state.prompts, view.state.is_loading) {
        html.push_str(r#"<div class="results"><div class="copy-actions">"#);
        for target in CopyTarget::ALL {
            let copied = view.copied == Some(target);
            html.push_str(&format!(
                r#"<button type="button" class="copy{}" data-target="{}" data-label="{}"{}>{}</button>"#,
                if copied { " copied" } else { "" },
                target.key(),
                target.button_label(),
                if copied { " disabled" } else { "" },
                if copied { "Copiado!" } else { target.button_label() },
            ));
        }
        html.push_str("</div>");

        for target in CopyTarget::ALL {
            html.push_str(&format!(
                r#"<section class="card"><h3>{}</h3><pre><code>{}</code></pre></section>"#,
                target.panel_title(),
                encode_text(&prompts.copy_text(target))
            ));
        }
        html.push_str("</div>");
    }

    html
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Gerador de Prompts de Vídeo</title>
    <style>
        body { font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; margin: 0; padding: 32px 16px; }
        main { max-width: 56rem; margin: 0 auto; }
        h1 { text-align: center; color: #38bdf8; }
        .intro { text-align: center; color: #94a3b8; }
        textarea { width: 100%; min-height: 6rem; box-sizing: border-box; background: #1e293b; color: inherit; border: 1px solid #334155; border-radius: 8px; padding: 12px; }
        .examples-caption { color: #94a3b8; font-size: 0.875rem; margin: 12px 0 0; }
        .examples { display: flex; flex-wrap: wrap; gap: 8px; margin: 12px 0; }
        button { cursor: pointer; border: 0; border-radius: 6px; padding: 8px 12px; }
        button:disabled { cursor: not-allowed; opacity: 0.6; }
        .example { background: #334155; color: #cbd5e1; }
        #generate { width: 100%; background: #0284c7; color: white; font-weight: bold; }
        .banner { margin-top: 24px; background: #7f1d1d80; border: 1px solid #b91c1c; color: #fca5a5; border-radius: 8px; padding: 12px; text-align: center; }
        .loader { margin-top: 24px; text-align: center; color: #38bdf8; }
        .copy-actions { display: flex; gap: 8px; margin: 24px 0 12px; }
        .copy { background: #0284c7; color: white; }
        .copy.copied { background: #16a34a; }
        .card { background: #1e293b; border-radius: 8px; padding: 12px 16px; margin-bottom: 16px; }
        pre { white-space: pre-wrap; word-break: break-word; }
    </style>
</head>
<body>
<main>
    <h1>Gerador de Prompts de Vídeo</h1>
    <p class="intro">Insira um tema abaixo e a IA irá gerar um prompt detalhado em português para sua análise, uma versão em inglês para usar em geradores de vídeo e uma estrutura JSON para automações.</p>
    <form id="theme-form">
        <textarea id="theme" placeholder="Ex: Uma cidade futurista em Marte ao entardecer" aria-label="Tema para o vídeo"></textarea>
        <p class="examples-caption">Sem ideias? Tente um destes temas:</p>
        <div class="examples">{{EXAMPLES}}</div>
        <button id="generate" type="submit" disabled>Gerar Prompts</button>
    </form>
    <div id="result"></div>
</main>
<script>
    const form = document.getElementById('theme-form');
    const theme = document.getElementById('theme');
    const generate = document.getElementById('generate');
    const result = document.getElementById('result');
    const failureBanner = {{FAILURE_BANNER}};
    let loading = false;
    let latest = 0;

    function sync() {
        theme.disabled = loading;
        document.querySelectorAll('.example').forEach((b) => { b.disabled = loading; });
        generate.disabled = loading || theme.value.trim() === '';
        generate.textContent = loading ? 'Gerando...' : 'Gerar Prompts';
    }

    theme.addEventListener('input', sync);

    document.querySelectorAll('.example').forEach((button) => {
        button.addEventListener('click', () => { theme.value = button.dataset.theme; sync(); });
    });

    form.addEventListener('submit', async (event) => {
        event.preventDefault();
        const request = ++latest;
        loading = true;
        sync();
        result.innerHTML = '<div class="loader" aria-busy="true">Gerando prompts...</div>';
        try {
            const response = await fetch('/generate', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ theme: theme.value }),
            });
            const html = response.ok ? await response.text() : failureBanner;
            if (!response.ok) { console.error('generate failed', response.status); }
            if (request === latest) { result.innerHTML = html; }
        } catch (err) {
            console.error(err);
            if (request === latest) { result.innerHTML = failureBanner; }
        } finally {
            if (request === latest) { loading = false; sync(); }
        }
    });

    result.addEventListener('click', async (event) => {
        const button = event.target.closest('.copy');
        if (!button) { return; }
        const response = await fetch('/copy/' + button.dataset.target, { method: 'POST' });
        if (!response.ok) { return; }
        await navigator.clipboard.writeText(await response.text());
        button.classList.add('copied');
        button.disabled = true;
        button.textContent = 'Copiado!';
        setTimeout(() => {
            button.classList.remove('copied');
            button.disabled = false;
            button.textContent = button.dataset.label;
        }, 2000);
    });
</script>
</body>
</html>
"#;
