/// Phase 5 (SPEC_FULL.md §4.5): per-wallet and overall verdict rules, applied
/// in priority order against the evidence accumulated in Phases 2-4.
use crate::bundle::phase4::Coordination;
use crate::model::{
    BundleOverallVerdict, BundleWalletAnalysis, BundleWalletVerdict, PostSellBehavior, PreSellBehavior, RedFlag,
};

pub fn wallet_verdict(wallet: &str, sol_spent: f64, pre: PreSellBehavior, post: PostSellBehavior, coordination: &Coordination) -> BundleWalletAnalysis {
    let mut red_flags = Vec::new();

    let direct_to_deployer = post.destinations.iter().any(|d| d.direct_transfer_to_deployer);
    let transfer_to_linked = post.destinations.iter().any(|d| d.transfer_to_deployer_linked_wallet);
    let indirect_link = post.destinations.iter().any(|d| d.indirect_via_intermediary);
    let common_destination = post.destinations.iter().any(|d| d.seen_in_other_bundles);

    if direct_to_deployer {
        red_flags.push(RedFlag::DirectTransferToDeployer);
    }
    if pre.prefund_source_is_deployer {
        red_flags.push(RedFlag::PrefundedByDeployer);
    }
    if transfer_to_linked {
        red_flags.push(RedFlag::TransferredToLinked);
    }
    if indirect_link {
        red_flags.push(RedFlag::IndirectLink);
    }
    if pre.prefund_source_is_known_funder {
        red_flags.push(RedFlag::FundedByCommon);
    }
    if pre.is_dormant {
        red_flags.push(RedFlag::DormantBeforeLaunch);
    }
    if common_destination {
        red_flags.push(RedFlag::CommonSink);
    }

    // |flags| in the Phase 5 rule text counts only the core evidence flags
    // above. The repeat-bundler flags below are additive context (Open
    // Question #2, DESIGN.md) and never participate in the threshold rules.
    let core_flag_count = red_flags.len();

    if pre.same_deployer_prior_launches > 0 {
        red_flags.push(RedFlag::RepeatBundlerSameDeployer);
    }
    if pre.prior_bundle_count >= 3 {
        red_flags.push(RedFlag::ProfessionalBundler);
    }

    // Priority-ordered, first match wins (SPEC_FULL.md §4.5 Phase 5).
    let verdict = if direct_to_deployer {
        BundleWalletVerdict::ConfirmedTeam
    } else if pre.prefund_source_is_deployer && transfer_to_linked {
        BundleWalletVerdict::ConfirmedTeam
    } else if transfer_to_linked {
        BundleWalletVerdict::SuspectedTeam
    } else if indirect_link && core_flag_count >= 2 {
        BundleWalletVerdict::SuspectedTeam
    } else if pre.prefund_source_is_deployer && core_flag_count >= 2 {
        BundleWalletVerdict::SuspectedTeam
    } else if core_flag_count >= 3 {
        BundleWalletVerdict::CoordinatedDump
    } else if pre.prefund_source_is_known_funder && common_destination {
        BundleWalletVerdict::CoordinatedDump
    } else if pre.is_dormant && common_destination {
        BundleWalletVerdict::CoordinatedDump
    } else {
        BundleWalletVerdict::EarlyBuyer
    };

    BundleWalletAnalysis { wallet: wallet.to_string(), sol_spent, pre_sell: pre, post_sell: post, red_flags, verdict }
}

pub fn overall_verdict(wallets: &[BundleWalletAnalysis], coordination: &Coordination) -> BundleOverallVerdict {
    let confirmed = wallets.iter().filter(|w| w.verdict == BundleWalletVerdict::ConfirmedTeam).count();
    let suspected = wallets.iter().filter(|w| w.verdict == BundleWalletVerdict::SuspectedTeam).count();
    let dumps = wallets.iter().filter(|w| w.verdict == BundleWalletVerdict::CoordinatedDump).count();
    let common_sinks = coordination.common_sink_wallets.len();

    // Priority-ordered, first match wins (SPEC_FULL.md §4.5 Phase 5).
    if confirmed >= 2 || (confirmed >= 1 && suspected >= 1) {
        BundleOverallVerdict::ConfirmedTeamExtraction
    } else if suspected >= 2 || confirmed >= 1 {
        BundleOverallVerdict::SuspectedTeamExtraction
    } else if dumps >= 3 && common_sinks >= 1 {
        BundleOverallVerdict::SuspectedTeamExtraction
    } else if dumps >= 3 || (dumps >= 2 && coordination.coordinated_sell_detected) {
        BundleOverallVerdict::CoordinatedDumpUnknownTeam
    } else {
        BundleOverallVerdict::EarlyBuyersNoLinkProven
    }
}

/// Human-readable evidence chain, one line per notable finding, surfaced
/// verbatim on [`crate::model::BundleExtractionReport`] (SPEC_FULL.md §4.5).
pub fn evidence_chain(wallets: &[BundleWalletAnalysis], coordination: &Coordination, verdict: BundleOverallVerdict) -> Vec<String> {
    let mut chain = Vec::new();
    chain.push(format!("overall verdict: {}", verdict.as_str()));

    for wallet in wallets {
        if wallet.red_flags.is_empty() {
            continue;
        }
        let flags: Vec<&str> = wallet.red_flags.iter().map(|f| f.as_str()).collect();
        chain.push(format!("{} [{}] -> {}", wallet.wallet, flags.join(", "), wallet.verdict.as_str()));
    }

    if coordination.coordinated_sell_detected {
        chain.push("coordinated sell window detected across bundle wallets".to_string());
    }
    if !coordination.common_prefund_sources.is_empty() {
        chain.push(format!("{} common prefund source(s) funded multiple bundle wallets", coordination.common_prefund_sources.len()));
    }
    if !coordination.common_sink_wallets.is_empty() {
        chain.push(format!("{} sink wallet(s) received funds from multiple bundle wallets", coordination.common_sink_wallets.len()));
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn coordination(coordinated_sell: bool) -> Coordination {
        Coordination { common_prefund_sources: HashSet::new(), coordinated_sell_detected: coordinated_sell, common_sink_wallets: HashSet::new() }
    }

    fn dest(link_to_deployer: bool, direct: bool, linked: bool, indirect: bool, common: bool) -> crate::model::FundDestination {
        crate::model::FundDestination {
            address: "dest".into(),
            amount_lamports: 1,
            hop: 0,
            link_to_deployer,
            direct_transfer_to_deployer: direct,
            transfer_to_deployer_linked_wallet: linked,
            indirect_via_intermediary: indirect,
            seen_in_other_bundles: common,
        }
    }

    #[test]
    fn direct_transfer_to_deployer_is_confirmed_team() {
        let pre = PreSellBehavior::default();
        let post = PostSellBehavior { full_sell_detected: true, destinations: vec![dest(true, true, false, false, false)], ..Default::default() };
        let analysis = wallet_verdict("w", 1.0, pre, post, &coordination(false));
        assert_eq!(analysis.verdict, BundleWalletVerdict::ConfirmedTeam);
        assert!(analysis.red_flags.contains(&RedFlag::DirectTransferToDeployer));
    }

    #[test]
    fn no_evidence_is_early_buyer() {
        let analysis = wallet_verdict("w", 1.0, PreSellBehavior::default(), PostSellBehavior::default(), &coordination(false));
        assert_eq!(analysis.verdict, BundleWalletVerdict::EarlyBuyer);
    }

    #[test]
    fn prefund_alone_without_linked_transfer_is_not_confirmed() {
        // prefund_source_is_deployer alone is not sufficient; rule 2 requires
        // it in conjunction with transfer_to_deployer_linked_wallet.
        let pre = PreSellBehavior { prefund_source_is_deployer: true, ..Default::default() };
        let analysis = wallet_verdict("w", 1.0, pre, PostSellBehavior::default(), &coordination(false));
        assert_ne!(analysis.verdict, BundleWalletVerdict::ConfirmedTeam);
    }

    #[test]
    fn prefund_by_deployer_plus_linked_transfer_is_confirmed_team() {
        let pre = PreSellBehavior { prefund_source_is_deployer: true, ..Default::default() };
        let post = PostSellBehavior { full_sell_detected: true, destinations: vec![dest(true, false, true, false, false)], ..Default::default() };
        let analysis = wallet_verdict("w", 1.0, pre, post, &coordination(false));
        assert_eq!(analysis.verdict, BundleWalletVerdict::ConfirmedTeam);
    }

    #[test]
    fn single_confirmed_wallet_alone_is_only_suspected_overall() {
        // End-to-end scenario 1 (SPEC_FULL.md §8): a lone confirmed_team
        // wallet needs a second confirmed or suspected wallet to escalate
        // the overall verdict to confirmed_team_extraction.
        let pre = PreSellBehavior::default();
        let post = PostSellBehavior { full_sell_detected: true, destinations: vec![dest(true, true, false, false, false)], ..Default::default() };
        let analysis = wallet_verdict("w1", 1.0, pre, post, &coordination(false));
        let verdict = overall_verdict(&[analysis], &coordination(false));
        assert_eq!(verdict, BundleOverallVerdict::SuspectedTeamExtraction);
    }

    #[test]
    fn confirmed_plus_suspected_drives_confirmed_team_extraction() {
        let confirmed_post = PostSellBehavior { full_sell_detected: true, destinations: vec![dest(true, true, false, false, false)], ..Default::default() };
        let confirmed = wallet_verdict("w1", 1.0, PreSellBehavior::default(), confirmed_post, &coordination(false));

        let suspected_post = PostSellBehavior { full_sell_detected: true, destinations: vec![dest(true, false, true, false, false)], ..Default::default() };
        let suspected = wallet_verdict("w2", 1.0, PreSellBehavior::default(), suspected_post, &coordination(false));

        let verdict = overall_verdict(&[confirmed, suspected], &coordination(false));
        assert_eq!(verdict, BundleOverallVerdict::ConfirmedTeamExtraction);
    }

    #[test]
    fn three_coordinated_dumps_to_common_sink_is_coordinated_dump_unknown_team() {
        // End-to-end scenario 2: no deployer link, but three wallets each
        // send sale proceeds to the same address and sell within a window.
        let coord = coordination(true);
        let wallets: Vec<BundleWalletAnalysis> = (0..3)
            .map(|i| {
                let pre = PreSellBehavior { prefund_source_is_known_funder: true, is_dormant: true, ..Default::default() };
                let post = PostSellBehavior { full_sell_detected: true, destinations: vec![dest(false, false, false, false, true)], ..Default::default() };
                wallet_verdict(&format!("w{i}"), 1.0, pre, post, &coord)
            })
            .collect();
        let verdict = overall_verdict(&wallets, &coord);
        assert_eq!(verdict, BundleOverallVerdict::CoordinatedDumpUnknownTeam);
    }
}
