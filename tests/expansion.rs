// tests/expansion.rs
use pretty_assertions::assert_eq;
use std::sync::Arc;
use treeline::{
    ExpansionCache, Grammar, GrammarError, GrammarExpander, TurtleInterpreter, dragon_curve,
    expand, fern, koch_curve, sierpinski_triangle,
};

fn presets() -> Vec<Grammar> {
    vec![koch_curve(), fern(), dragon_curve(), sierpinski_triangle()]
}

#[test]
fn test_depth_zero_is_axiom() {
    for grammar in presets() {
        assert_eq!(expand(&grammar, 0), grammar.axiom().to_vec(), "{}", grammar.name());
    }
}

#[test]
fn test_koch_generations() {
    let koch = koch_curve();

    assert_eq!(expand(&koch, 1), b"F+F-F-F+F".to_vec());

    // 5 F's become 9 symbols each, the 4 turns survive unchanged.
    let second = expand(&koch, 2);
    assert_eq!(second.len(), 49);
    assert_eq!(&second[..10], b"F+F-F-F+F+");
}

#[test]
fn test_empty_axiom_stays_empty() {
    let grammar = Grammar::new("empty", "", [('F', "FF")], 0.5).unwrap();
    for depth in 0..6 {
        assert!(expand(&grammar, depth).is_empty());
    }
}

#[test]
fn test_symbols_without_rules_are_identity() {
    let grammar = Grammar::new("markers", "AFB", [('F', "F[F]")], 0.5).unwrap();
    assert_eq!(expand(&grammar, 1), b"AF[F]B".to_vec());
    assert_eq!(expand(&grammar, 2), b"AF[F][F[F]]B".to_vec());
}

#[test]
fn test_fern_draw_count_recurrence() {
    let fern = fern();
    let interpreter = TurtleInterpreter::default();

    for depth in 1..=6u32 {
        let expected = 3 * (1usize << (depth - 1)) * ((1usize << depth) - 1);
        let symbols = expand(&fern, depth);
        assert_eq!(interpreter.count_segments(&symbols), expected, "depth {depth}");
    }
}

#[test]
fn test_parallel_expander_is_deterministic() {
    let expander = GrammarExpander::new(4).with_parallel_threshold(8);

    for grammar in presets() {
        let reference = expand(&grammar, 5);
        assert_eq!(expander.expand(&grammar, 5), reference, "{}", grammar.name());
        assert_eq!(expander.expand(&grammar, 5), reference, "{}", grammar.name());
    }
}

#[test]
fn test_cached_expansion_matches_fresh() {
    let cache = ExpansionCache::default();
    let dragon = dragon_curve();

    let first = cache.get_or_expand(&dragon, 6);
    let second = cache.get_or_expand(&dragon, 6);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.to_vec(), expand(&dragon, 6));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_keys_ignore_turn_angle() {
    let cache = ExpansionCache::default();
    let koch = koch_curve();
    let skewed = koch.with_turn_angle(1.2);

    let a = cache.get_or_expand(&koch, 3);
    let b = cache.get_or_expand(&skewed, 3);
    cache.get_or_expand(&koch, 2);

    assert!(Arc::ptr_eq(&a, &b));
    assert!(cache.contains(&skewed, 2));
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_cache_fills_publish_once() {
    let cache = &ExpansionCache::default();
    let fern = &fern();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || cache.get_or_expand(fern, 5)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.len(), 1);
    for result in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], result));
    }
}

#[test]
fn test_non_ascii_symbols_are_rejected() {
    let err = Grammar::new("bad", "Fé", [('F', "FF")], 0.1).unwrap_err();
    assert_eq!(
        err,
        GrammarError::NonAsciiSymbol {
            context: "axiom",
            found: 'é'
        }
    );

    let err = Grammar::new("bad", "F", [('F', "F→F")], 0.1).unwrap_err();
    assert!(matches!(err, GrammarError::NonAsciiSymbol { context: "rule body", .. }));
}
