/// Static address-identity classifier (SPEC_FULL.md §4.11).
///
/// Frozen at compile time like the teacher's `pools::constants` program-id
/// tables; the same sets double as skip lists for bundle forensics and flow
/// tracing (SPEC_FULL.md §9 "canonical `SYSTEM_PROGRAMS`/`SKIP_PROGRAMS`/
/// `CEX_ADDRESSES` sets are the single source of truth").
mod tables;

pub use crate::model::flow::EntityType;

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use tables::{
    BRIDGE_PROGRAMS, CEX_ADDRESSES, CEX_DEPOSIT_PREFIXES, DEX_PROGRAMS, LAUNCHPAD_PROGRAMS,
    MEV_TIP_ACCOUNTS, SYSTEM_PROGRAMS,
};

/// True for a known Raydium/Meteora/Orca/Jupiter program id
/// (SPEC_FULL.md §4.7 signal 7 "invoked a DEX/AMM program").
pub fn is_dex_program(address: &str) -> bool {
    DEX_PROGRAMS.iter().any(|(addr, _)| *addr == address)
}

struct LabelEntry {
    label: &'static str,
    entity_type: EntityType,
}

static LABELS: Lazy<HashMap<&'static str, LabelEntry>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (addr, label) in SYSTEM_PROGRAMS {
        map.insert(*addr, LabelEntry { label, entity_type: EntityType::System });
    }
    for (addr, label) in DEX_PROGRAMS {
        map.insert(*addr, LabelEntry { label, entity_type: EntityType::Dex });
    }
    for (addr, label) in BRIDGE_PROGRAMS {
        map.insert(*addr, LabelEntry { label, entity_type: EntityType::Bridge });
    }
    for (addr, label) in LAUNCHPAD_PROGRAMS {
        map.insert(*addr, LabelEntry { label, entity_type: EntityType::Launchpad });
    }
    for (addr, label) in MEV_TIP_ACCOUNTS {
        map.insert(*addr, LabelEntry { label, entity_type: EntityType::Mev });
    }
    for (addr, label) in CEX_ADDRESSES {
        map.insert(*addr, LabelEntry { label, entity_type: EntityType::Cex });
    }
    map
});

/// Union of every program/system/skip address — used as the skip set for
/// bundle forensics and SOL-flow tracing (SPEC_FULL.md §4.5, §4.6).
pub static SKIP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    SYSTEM_PROGRAMS
        .iter()
        .chain(DEX_PROGRAMS.iter())
        .chain(LAUNCHPAD_PROGRAMS.iter())
        .chain(MEV_TIP_ACCOUNTS.iter())
        .map(|(addr, _)| *addr)
        .collect()
});

pub fn classify_address(address: &str) -> (Option<String>, Option<EntityType>) {
    if let Some(entry) = LABELS.get(address) {
        return (Some(entry.label.to_string()), Some(entry.entity_type));
    }
    for (prefix, label) in CEX_DEPOSIT_PREFIXES {
        if address.starts_with(prefix) {
            return (Some(label.to_string()), Some(EntityType::Cex));
        }
    }
    (None, None)
}

pub fn is_bridge_program(address: &str) -> bool {
    BRIDGE_PROGRAMS.iter().any(|(addr, _)| *addr == address)
}

pub fn is_cex_address(address: &str) -> bool {
    CEX_ADDRESSES.iter().any(|(addr, _)| *addr == address)
}

pub fn is_skip_address(address: &str) -> bool {
    SKIP_SET.contains(address)
}

/// Label if known, else a shortened `abcd…wxyz` rendering of the address.
pub fn label_or_short(address: &str) -> String {
    if let (Some(label), _) = classify_address(address) {
        return label;
    }
    if address.len() > 10 {
        format!("{}…{}", &address[..4], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_system_program() {
        let (label, entity) = classify_address("11111111111111111111111111111111");
        assert!(label.is_some());
        assert_eq!(entity, Some(EntityType::System));
    }

    #[test]
    fn unknown_address_falls_back_to_short_form() {
        let addr = "Abc1234567890XyzDeadBeefCafeBabe00000001";
        let (label, entity) = classify_address(addr);
        assert!(label.is_none());
        assert!(entity.is_none());
        let short = label_or_short(addr);
        assert!(short.contains('…'));
    }
}
