//! Authorize handler: run one negotiation and report the grant.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use portalgate_core::{GrantStatus, NegotiationEngine, NegotiationPath, TimeEncoding};

use crate::cli::{AuthorizeArgs, GlobalOpts};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AuthorizeReport {
    client: String,
    authorized: bool,
    path: NegotiationPath,
    attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<TimeEncoding>,
    granted_for: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires: Option<String>,
    /// Seconds until the seat assignment may be shown.
    reveal_in: u64,
    /// Emergency-exit number when the SSID is `exit_<n>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    exit: Option<u32>,
}

fn spinner(global: &GlobalOpts) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("negotiating with controller...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub async fn handle(args: &AuthorizeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = util::context_from_args(&args.context)?;
    let portal = config::build_portal_config(global)?;
    let engine = NegotiationEngine::from_config(&portal)?;

    let pb = spinner(global);
    let result = engine
        .authorize(&ctx, args.seconds, args.prefer_duration)
        .await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let outcome = result?;

    if !outcome.ok {
        tracing::info!(
            path = %outcome.path,
            attempts = outcome.attempts,
            response = %outcome.response,
            "authorization failed"
        );
        return Err(CliError::AuthorizationDenied {
            detail: (global.verbose > 0).then(|| format!("controller said: {}", outcome.response)),
        });
    }

    let Some(key) = ctx.key() else {
        return Err(CliError::NoClientContext);
    };
    let now = chrono::Utc::now().timestamp();
    let expires = match engine.grants().status(&key, now) {
        GrantStatus::Authorized { expires } => {
            chrono::DateTime::from_timestamp(expires, 0).map(|t| t.to_rfc3339())
        }
        GrantStatus::Unauthorized => None,
    };
    let report = AuthorizeReport {
        client: key.to_string(),
        authorized: true,
        path: outcome.path,
        attempts: outcome.attempts,
        encoding: outcome.encoding,
        granted_for: humantime::format_duration(Duration::from_secs(args.seconds)).to_string(),
        expires,
        reveal_in: engine
            .grants()
            .reveal_left(&key, now, portal.reveal_delay_secs),
        exit: ctx.exit_number(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            output::detail_block(&[
                ("client", r.client.clone()),
                ("status", output::verdict(true, "authorized", color)),
                ("granted", r.granted_for.clone()),
                ("expires", r.expires.clone().unwrap_or_else(|| "-".into())),
                ("via", r.path.to_string()),
                (
                    "encoding",
                    r.encoding.map_or_else(|| "-".into(), |e| e.to_string()),
                ),
                ("calls", r.attempts.to_string()),
                ("reveal in", format!("{}s", r.reveal_in)),
                ("exit", r.exit.map_or_else(|| "-".into(), |n| n.to_string())),
            ])
        },
        |r| r.client.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
