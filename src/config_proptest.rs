//! Property-based tests for reference parsing and the small arithmetic
//! helpers the merge relies on.

#[cfg(test)]
mod proptest_tests {
    use std::time::Duration;

    use crate::config::RepoRef;
    use crate::gh::backoff_delay;
    use crate::sources::milestones::{calculate_progress, milestone_version, select_active_milestone, Milestone};
    use proptest::prelude::*;

    fn milestone(title: String) -> Milestone {
        Milestone {
            title,
            open_issues: 0,
            closed_issues: 0,
            total_issues: 0,
            progress: 0,
            due_on: None,
            url: String::new(),
        }
    }

    // ============================================================================
    // RepoRef property tests
    // ============================================================================

    proptest! {
        /// Property: any two non-empty slash-free segments parse and display back
        #[test]
        fn repo_ref_round_trips(owner in "[A-Za-z0-9_.-]{1,20}", repo in "[A-Za-z0-9_.-]{1,30}") {
            let reference = format!("{}/{}", owner, repo);
            let parsed = RepoRef::parse(&reference).unwrap();
            prop_assert_eq!(&parsed.owner, &owner);
            prop_assert_eq!(&parsed.repo, &repo);
            prop_assert_eq!(parsed.to_string(), reference);
        }

        /// Property: parsing succeeds exactly when there are two non-empty segments
        #[test]
        fn repo_ref_requires_two_segments(input in "[a-z/]{0,12}") {
            let segments: Vec<&str> = input.split('/').collect();
            let valid = segments.len() == 2 && segments.iter().all(|s| !s.is_empty());
            prop_assert_eq!(RepoRef::parse(&input).is_ok(), valid);
        }
    }

    // ============================================================================
    // Progress and backoff property tests
    // ============================================================================

    proptest! {
        /// Property: progress is a percentage
        #[test]
        fn progress_is_bounded(open in 0u64..100_000, closed in 0u64..100_000) {
            let progress = calculate_progress(open, closed);
            prop_assert!(progress <= 100);
            if closed == 0 {
                prop_assert_eq!(progress, 0);
            }
            if open == 0 && closed > 0 {
                prop_assert_eq!(progress, 100);
            }
        }

        /// Property: the delay never drops below the server's hint or the base delay
        #[test]
        fn backoff_respects_floors(attempt in 0u32..8, base_ms in 0u64..5_000, hint in proptest::option::of(0u64..600)) {
            let base = Duration::from_millis(base_ms);
            let delay = backoff_delay(attempt, base, hint);
            prop_assert!(delay >= base);
            prop_assert!(delay >= base * 2u32.pow(attempt));
            if let Some(secs) = hint {
                prop_assert!(delay >= Duration::from_secs(secs));
            }
        }
    }

    // ============================================================================
    // Milestone selection property tests
    // ============================================================================

    proptest! {
        /// Property: the selected milestone has the lowest version of all titles
        #[test]
        fn selection_picks_minimum_version(versions in proptest::collection::vec((0u64..20, 0u64..20, 0u64..20), 1..10)) {
            let milestones: Vec<Milestone> = versions
                .iter()
                .map(|(a, b, c)| milestone(format!("v{}.{}.{}", a, b, c)))
                .collect();

            let selected = select_active_milestone(&milestones).unwrap();
            let selected_version = milestone_version(&selected.title).unwrap();
            for m in &milestones {
                prop_assert!(selected_version <= milestone_version(&m.title).unwrap());
            }
        }
    }
}
