//! Login handler: establish an operator session and report where it landed.

use serde::Serialize;

use portalgate_core::NegotiationEngine;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct LoginReport {
    controller: String,
    base: String,
    operator: String,
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let portal = config::build_portal_config(global)?;
    let engine = NegotiationEngine::from_config(&portal)?;
    let session = engine.session().login().await?;

    let report = LoginReport {
        controller: portal.host.to_string(),
        base: session.base.to_string(),
        operator: portal.operator.username.clone(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            output::detail_block(&[
                ("login", output::verdict(true, "ok", color)),
                ("operator", r.operator.clone()),
                ("base", r.base.clone()),
            ])
        },
        |r| r.base.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
