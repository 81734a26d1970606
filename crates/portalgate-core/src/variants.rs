// ── Payload variant generator ──
//
// Enumerates the candidate request bodies for one client, in a fixed
// order that is part of the observable contract:
//
//   MAC set (ap, gateway, both)
//     x extra field (vlan, ssid, nothing)
//       x auth type (4, 8, 1)
//
// 27 positions in total. Positions whose merged payload lacks a client
// MAC or site are skipped, never yielded.

use std::iter::FusedIterator;

use crate::model::context::non_empty;
use crate::model::{AuthType, CandidatePayload, ClientContext};

/// Which device MACs accompany the client MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacSet {
    AccessPoint,
    Gateway,
    Both,
}

/// Which optional network field accompanies the MACs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraField {
    Vlan,
    Ssid,
    Nothing,
}

const MAC_SETS: [MacSet; 3] = [MacSet::AccessPoint, MacSet::Gateway, MacSet::Both];
const EXTRA_FIELDS: [ExtraField; 3] = [ExtraField::Vlan, ExtraField::Ssid, ExtraField::Nothing];
const POSITIONS: usize = MAC_SETS.len() * EXTRA_FIELDS.len() * AuthType::CANDIDATES.len();

/// Context values resolved once per generator.
#[derive(Debug, Clone)]
struct Resolved {
    client_mac: Option<String>,
    site: String,
    client_ip: Option<String>,
    radio_id: Option<i64>,
    ap_mac: Option<String>,
    gateway_mac: Option<String>,
    vid: Option<u16>,
    ssid_name: Option<String>,
}

impl Resolved {
    fn new(ctx: &ClientContext, default_vlan: Option<u16>) -> Self {
        let ap = non_empty(ctx.ap_mac.as_ref());
        let gw = non_empty(ctx.gateway_mac.as_ref());

        // Each device MAC falls back to the other when the redirect only
        // carried one of them.
        Self {
            client_mac: ctx.client_mac().map(str::to_owned),
            site: ctx.site().to_owned(),
            client_ip: non_empty(ctx.client_ip.as_ref()).map(str::to_owned),
            radio_id: non_empty(ctx.radio_id.as_ref()).and_then(|r| r.trim().parse().ok()),
            ap_mac: ap.or(gw).map(str::to_owned),
            gateway_mac: gw.or(ap).map(str::to_owned),
            vid: non_empty(ctx.vid.as_ref())
                .and_then(|v| v.trim().parse().ok())
                .or(default_vlan)
                .filter(|v| *v != 0),
            ssid_name: non_empty(ctx.ssid_name.as_ref()).map(str::to_owned),
        }
    }

    fn candidate(
        &self,
        mac_set: MacSet,
        extra: ExtraField,
        auth_type: AuthType,
    ) -> Option<CandidatePayload> {
        let client_mac = self.client_mac.clone()?;
        if self.site.is_empty() {
            return None;
        }

        let (ap_mac, gateway_mac) = match mac_set {
            MacSet::AccessPoint => (self.ap_mac.clone(), None),
            MacSet::Gateway => (None, self.gateway_mac.clone()),
            MacSet::Both => (self.ap_mac.clone(), self.gateway_mac.clone()),
        };
        let (vid, ssid_name) = match extra {
            ExtraField::Vlan => (self.vid, None),
            ExtraField::Ssid => (None, self.ssid_name.clone()),
            ExtraField::Nothing => (None, None),
        };

        Some(CandidatePayload {
            client_mac,
            site: self.site.clone(),
            auth_type,
            client_ip: self.client_ip.clone(),
            radio_id: self.radio_id,
            ap_mac,
            gateway_mac,
            vid,
            ssid_name,
        })
    }
}

/// Lazy, finite iterator over the candidate search space.
///
/// Each call to [`payload_variants`] starts a fresh sequence.
#[derive(Debug, Clone)]
pub struct PayloadVariants {
    resolved: Resolved,
    position: usize,
}

/// The ordered candidate search space for `ctx`.
pub fn payload_variants(ctx: &ClientContext, default_vlan: Option<u16>) -> PayloadVariants {
    PayloadVariants {
        resolved: Resolved::new(ctx, default_vlan),
        position: 0,
    }
}

impl PayloadVariants {
    /// Position -> (mac set, extra field, auth type), outer to inner.
    fn combination(position: usize) -> (MacSet, ExtraField, AuthType) {
        let auths = AuthType::CANDIDATES.len();
        let extras = EXTRA_FIELDS.len();
        (
            MAC_SETS[position / (extras * auths)],
            EXTRA_FIELDS[(position / auths) % extras],
            AuthType::CANDIDATES[position % auths],
        )
    }
}

impl Iterator for PayloadVariants {
    type Item = CandidatePayload;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < POSITIONS {
            let (mac_set, extra, auth_type) = Self::combination(self.position);
            self.position += 1;
            if let Some(candidate) = self.resolved.candidate(mac_set, extra, auth_type) {
                return Some(candidate);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(POSITIONS - self.position))
    }
}

impl FusedIterator for PayloadVariants {}
