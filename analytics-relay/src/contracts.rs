/// Label for addresses missing from [`CONTRACT_LABELS`].
pub const UNKNOWN_CONTRACT: &str = "unknown";

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Known contract addresses and the labels reported for them.
pub const CONTRACT_LABELS: &[(&str, &str)] = &[
    (ZERO_ADDRESS, "burn"),
    ("0x8f9b3A2Eb1dfa6D90dEE7C6373f9C0088FeEebAB", "lens"),
];

/// Exact-match lookup; unlisted addresses resolve to [`UNKNOWN_CONTRACT`].
pub fn resolve_contract_label(address: &str) -> &'static str {
    CONTRACT_LABELS
        .iter()
        .find(|(known, _)| *known == address)
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_CONTRACT)
}
