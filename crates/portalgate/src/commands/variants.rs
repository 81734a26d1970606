//! Variants handler: list the candidate search space without contacting
//! the controller.

use tabled::Tabled;

use portalgate_core::{CandidatePayload, payload_variants};

use crate::cli::{GlobalOpts, VariantsArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct VariantRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Auth")]
    auth_type: u8,
    #[tabled(rename = "AP MAC")]
    ap_mac: String,
    #[tabled(rename = "Gateway MAC")]
    gateway_mac: String,
    #[tabled(rename = "VLAN")]
    vid: String,
    #[tabled(rename = "SSID")]
    ssid: String,
}

fn dash<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".into(), ToString::to_string)
}

pub fn handle(args: &VariantsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = util::context_from_args(&args.context)?;

    let default_vlan = match args.default_vlan {
        Some(vlan) => vlan,
        None => {
            let cfg = config::load_config_or_default();
            let name = config::active_profile_name(global, &cfg);
            cfg.profiles
                .get(&name)
                .and_then(|p| p.default_vlan)
                .unwrap_or(cfg.defaults.default_vlan)
        }
    };

    let candidates: Vec<CandidatePayload> =
        payload_variants(&ctx, Some(default_vlan).filter(|v| *v != 0)).collect();

    let mut index = 0;
    let out = output::render_list(
        &global.output,
        &candidates,
        |p| {
            index += 1;
            VariantRow {
                index,
                auth_type: p.auth_type.code(),
                ap_mac: dash(p.ap_mac.as_ref()),
                gateway_mac: dash(p.gateway_mac.as_ref()),
                vid: dash(p.vid.as_ref()),
                ssid: dash(p.ssid_name.as_ref()),
            }
        },
        |p| serde_json::to_string(p).unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
