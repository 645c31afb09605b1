use std::collections::{HashMap, HashSet};

use painpoint_common::{Analysis, PainPoint};

/// Folds partial chunk analyses into one. A trait so the orchestrator's merge
/// step can be observed in tests.
pub trait AnalysisMerger: Send + Sync {
    fn merge(&self, partials: Vec<Analysis>) -> Option<Analysis>;
}

/// Count-weighted merge, see [`merge_analyses`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMerger;

impl AnalysisMerger for WeightedMerger {
    fn merge(&self, partials: Vec<Analysis>) -> Option<Analysis> {
        merge_analyses(partials)
    }
}

/// Merge partial analyses into a single result.
///
/// - No inputs: `None`. One input: returned as-is.
/// - Pain points whose topics match case-insensitively are folded: counts
///   add, sentiment becomes the count-weighted mean, examples are unioned.
///   The first spelling of the topic wins.
/// - Ideas are deduplicated by exact string, first occurrence order.
/// - `sentimentScore` is weighted by each input's `totalComments`; it is
///   `0.0` when no comments are represented at all.
/// - Pain points end up sorted by count, descending. Ties keep input order.
pub fn merge_analyses(mut partials: Vec<Analysis>) -> Option<Analysis> {
    match partials.len() {
        0 => return None,
        1 => return partials.pop(),
        _ => {}
    }

    let mut pain_points: Vec<PainPoint> = Vec::new();
    let mut by_topic: HashMap<String, usize> = HashMap::new();
    let mut ideas: Vec<String> = Vec::new();
    let mut seen_ideas: HashSet<String> = HashSet::new();
    let mut weighted_sentiment = 0.0_f64;
    let mut total_comments = 0_u32;

    for partial in partials {
        for incoming in partial.pain_points {
            let key = incoming.topic.to_lowercase();
            match by_topic.get(&key) {
                Some(&slot) => fold_into(&mut pain_points[slot], incoming),
                None => {
                    by_topic.insert(key, pain_points.len());
                    pain_points.push(incoming);
                }
            }
        }

        for idea in partial.potential_ideas {
            if seen_ideas.insert(idea.clone()) {
                ideas.push(idea);
            }
        }

        total_comments = total_comments.saturating_add(partial.total_comments);
        weighted_sentiment += partial.sentiment_score * f64::from(partial.total_comments);
    }

    let sentiment_score = if total_comments == 0 {
        0.0
    } else {
        weighted_sentiment / f64::from(total_comments)
    };

    pain_points.sort_by(|a, b| b.count.cmp(&a.count));

    Some(Analysis {
        pain_points,
        potential_ideas: ideas,
        sentiment_score,
        total_comments,
    })
}

fn fold_into(existing: &mut PainPoint, incoming: PainPoint) {
    let prior = f64::from(existing.count);
    let added = f64::from(incoming.count);
    let combined = existing.count.saturating_add(incoming.count);

    existing.sentiment = (existing.sentiment * prior + incoming.sentiment * added) / (prior + added);
    existing.count = combined;

    let mut seen: HashSet<String> = HashSet::new();
    let examples = std::mem::take(&mut existing.examples);
    existing.examples = examples
        .into_iter()
        .chain(incoming.examples)
        .filter(|example| seen.insert(example.clone()))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{analysis, pain_point};

    const EPS: f64 = 1e-9;

    #[test]
    fn merging_nothing_is_absent() {
        assert_eq!(merge_analyses(vec![]), None);
    }

    #[test]
    fn merging_one_returns_it_unchanged() {
        // Deliberately unsorted and with a duplicate idea: identity means no recomputation.
        let only = Analysis {
            pain_points: vec![pain_point("Docs", 1, 0.1), pain_point("Billing", 9, -0.8)],
            potential_ideas: vec!["Same".into(), "Same".into()],
            sentiment_score: 0.25,
            total_comments: 0,
        };
        assert_eq!(merge_analyses(vec![only.clone()]), Some(only));
    }

    #[test]
    fn sentiment_is_weighted_by_comment_count() {
        let a = analysis(vec![], vec![], 0.5, 10);
        let b = analysis(vec![], vec![], -0.5, 30);

        let merged = merge_analyses(vec![a, b]).unwrap();
        assert_eq!(merged.total_comments, 40);
        assert!((merged.sentiment_score - (-0.25)).abs() < EPS);
    }

    #[test]
    fn zero_comments_gives_neutral_sentiment() {
        let a = analysis(vec![], vec![], 0.9, 0);
        let b = analysis(vec![], vec![], -0.4, 0);

        let merged = merge_analyses(vec![a, b]).unwrap();
        assert_eq!(merged.total_comments, 0);
        assert_eq!(merged.sentiment_score, 0.0);
    }

    #[test]
    fn topics_fold_case_insensitively() {
        let a = analysis(vec![pain_point("Slow builds", 3, -0.2)], vec![], 0.0, 5);
        let b = analysis(vec![pain_point("slow builds", 5, -0.6)], vec![], 0.0, 5);

        let merged = merge_analyses(vec![a, b]).unwrap();
        assert_eq!(merged.pain_points.len(), 1);

        let folded = &merged.pain_points[0];
        assert_eq!(folded.topic, "Slow builds");
        assert_eq!(folded.count, 8);
        assert!((folded.sentiment - (-0.45)).abs() < EPS);
    }

    #[test]
    fn repeated_folds_keep_running_weighted_mean() {
        let a = analysis(vec![pain_point("Pricing", 1, 1.0)], vec![], 0.0, 1);
        let b = analysis(vec![pain_point("PRICING", 1, 0.0)], vec![], 0.0, 1);
        let c = analysis(vec![pain_point("pricing", 2, -1.0)], vec![], 0.0, 1);

        let merged = merge_analyses(vec![a, b, c]).unwrap();
        let folded = &merged.pain_points[0];
        assert_eq!(folded.count, 4);
        // (1*1 + 0*1 + -1*2) / 4
        assert!((folded.sentiment - (-0.25)).abs() < EPS);
    }

    #[test]
    fn ideas_are_deduplicated_exactly() {
        let a = analysis(vec![], vec!["A tool for X", "A tool for Y"], 0.0, 1);
        let b = analysis(vec![], vec!["A tool for X", "a tool for x"], 0.0, 1);

        let merged = merge_analyses(vec![a, b]).unwrap();
        assert_eq!(
            merged.potential_ideas,
            vec!["A tool for X", "A tool for Y", "a tool for x"]
        );
    }

    #[test]
    fn examples_are_unioned_without_duplicates() {
        let mut first = pain_point("Flaky tests", 2, -0.5);
        first.examples = vec!["CI is red again".into(), "retry until green".into()];
        let mut second = pain_point("flaky tests", 1, -0.5);
        second.examples = vec!["retry until green".into(), "quarantine list grows".into()];

        let merged = merge_analyses(vec![
            analysis(vec![first], vec![], 0.0, 2),
            analysis(vec![second], vec![], 0.0, 1),
        ])
        .unwrap();

        assert_eq!(
            merged.pain_points[0].examples,
            vec!["CI is red again", "retry until green", "quarantine list grows"]
        );
    }

    #[test]
    fn pain_points_sorted_by_count_with_stable_ties() {
        let a = analysis(
            vec![pain_point("Docs", 2, 0.0), pain_point("Onboarding", 2, 0.0)],
            vec![],
            0.0,
            1,
        );
        let b = analysis(
            vec![pain_point("Billing", 7, 0.0), pain_point("Search", 2, 0.0)],
            vec![],
            0.0,
            1,
        );

        let merged = merge_analyses(vec![a, b]).unwrap();
        let topics: Vec<&str> = merged.pain_points.iter().map(|p| p.topic.as_str()).collect();
        assert_eq!(topics, vec!["Billing", "Docs", "Onboarding", "Search"]);
    }

    #[test]
    fn merge_is_commutative_up_to_ordering() {
        let a = analysis(
            vec![pain_point("Slow builds", 3, -0.2), pain_point("Docs", 1, 0.4)],
            vec!["Build cache", "Doc linter"],
            0.3,
            12,
        );
        let b = analysis(
            vec![pain_point("slow BUILDS", 5, -0.6), pain_point("Pricing", 4, -0.9)],
            vec!["Doc linter", "Pricing calculator"],
            -0.7,
            20,
        );

        let ab = merge_analyses(vec![a.clone(), b.clone()]).unwrap();
        let ba = merge_analyses(vec![b, a]).unwrap();

        assert_eq!(ab.total_comments, ba.total_comments);
        assert!((ab.sentiment_score - ba.sentiment_score).abs() < EPS);

        let summarize = |m: &Analysis| {
            let mut points: Vec<(String, u32)> = m
                .pain_points
                .iter()
                .map(|p| (p.topic.to_lowercase(), p.count))
                .collect();
            points.sort();
            let mut ideas = m.potential_ideas.clone();
            ideas.sort();
            (points, ideas)
        };
        assert_eq!(summarize(&ab), summarize(&ba));

        for (x, y) in ab.pain_points.iter().zip(ba.pain_points.iter()) {
            if x.topic.eq_ignore_ascii_case(&y.topic) {
                assert!((x.sentiment - y.sentiment).abs() < EPS);
            }
        }
    }

    #[test]
    fn weighted_merger_delegates() {
        let a = analysis(vec![], vec!["One"], 1.0, 1);
        let b = analysis(vec![], vec!["Two"], -1.0, 1);
        let merged = WeightedMerger.merge(vec![a, b]).unwrap();
        assert_eq!(merged.potential_ideas, vec!["One", "Two"]);
        assert!(merged.sentiment_score.abs() < EPS);
    }
}
