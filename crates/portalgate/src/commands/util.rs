//! Shared helpers for command handlers.

use portalgate_core::ClientContext;

use crate::cli::ContextArgs;
use crate::error::CliError;

/// Build a client context from `--redirect` plus individual flag overrides.
pub fn context_from_args(args: &ContextArgs) -> Result<ClientContext, CliError> {
    let mut ctx = match args.redirect.as_deref() {
        Some(raw) => {
            let url = url::Url::parse(raw).map_err(|e| CliError::Validation {
                field: "redirect".into(),
                reason: format!("invalid URL: {e}"),
            })?;
            ClientContext::from_redirect_url(&url)
        }
        None => ClientContext::default(),
    };

    let overrides = [
        (&mut ctx.client_mac, &args.client_mac),
        (&mut ctx.client_ip, &args.client_ip),
        (&mut ctx.ap_mac, &args.ap_mac),
        (&mut ctx.gateway_mac, &args.gateway_mac),
        (&mut ctx.ssid_name, &args.ssid),
        (&mut ctx.radio_id, &args.radio_id),
        (&mut ctx.site, &args.site),
        (&mut ctx.vid, &args.vid),
    ];
    for (slot, flag) in overrides {
        if flag.is_some() {
            slot.clone_from(flag);
        }
    }

    if ctx.client_mac().is_none() {
        return Err(CliError::NoClientContext);
    }
    Ok(ctx)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
