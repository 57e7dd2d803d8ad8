//! End-to-end pipeline tests: filtering gates, activation-weighted ranking,
//! learning side effects, graph expansion, and degradation paths.

mod helpers;

use engram::config::EngramConfig;
use engram::memory::activation::bump_activations;
use engram::memory::cooccurrence::reinforce;
use helpers::*;

#[tokio::test]
async fn strong_match_admits_only_qualifying_candidates() {
    let conn = test_db();
    seed_fact(&conn, 1, "marcus", "employer", "acme");
    seed_fact(&conn, 2, "marcus", "pet", "cat");

    let provider = StaticProvider {
        hits: vec![
            hit("marcus", "employer", "acme", 80.0, Some(1)),
            hit("marcus", "pet", "cat", 40.0, Some(2)),
        ],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    let context = retriever.retrieve("where does marcus work").await;

    // 40 is below the tier-2 floor of 50 — exactly one fact survives
    assert_eq!(context.primary.len(), 1);
    assert_eq!(context.primary[0].hit.key, "employer");
}

#[tokio::test]
async fn fulltext_hits_ride_along_with_an_entity_match() {
    let conn = test_db();
    let provider = StaticProvider {
        hits: vec![
            hit("notes", "one", "a", 55.0, None),
            hit("notes", "two", "b", 90.0, None),
        ],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    let context = retriever.retrieve("what is in the notes").await;

    // 55 qualifies (50 <= 55 < 65) because the 90 anchors the query;
    // ordering is by combined score, strongest first
    assert_eq!(context.primary.len(), 2);
    assert_eq!(context.primary[0].hit.score, 90.0);
    assert_eq!(context.primary[1].hit.score, 55.0);
}

#[tokio::test]
async fn keyword_only_matches_are_rejected_wholesale() {
    let conn = test_db();
    let provider = StaticProvider {
        hits: vec![
            hit("a", "k", "v", 55.0, None),
            hit("b", "k", "v", 55.0, None),
            hit("c", "k", "v", 64.0, None),
        ],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    let context = retriever.retrieve("some keyword query").await;

    assert!(context.is_empty());
    assert_eq!(context.render(), "");
}

#[tokio::test]
async fn activation_reorders_close_relevance_scores() {
    let mut conn = test_db();
    seed_fact(&conn, 1, "cold", "k", "v");
    seed_fact(&conn, 2, "hot", "k", "v");

    // fact 2 has been retrieved often; fact 1 never
    bump_activations(&mut conn, &[2], 10.0).unwrap();

    let provider = StaticProvider {
        hits: vec![
            hit("cold", "k", "v", 80.0, Some(1)),
            hit("hot", "k", "v", 78.0, Some(2)),
        ],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    let context = retriever.retrieve("hot or cold fact").await;

    // 0.78*0.7 + 1.0*0.3 beats 0.80*0.7 + 0.0*0.3
    assert_eq!(context.primary[0].hit.entity, "hot");
    assert_eq!(context.primary[1].hit.entity, "cold");
}

#[tokio::test]
async fn retrieval_bumps_activation_and_wires_edges() {
    let conn = test_db();
    seed_fact(&conn, 1, "a", "k", "v");
    seed_fact(&conn, 2, "b", "k", "v");

    let provider = StaticProvider {
        hits: vec![
            hit("a", "k", "v", 80.0, Some(1)),
            hit("b", "k", "v", 70.0, Some(2)),
        ],
    };
    let (retriever, store) = retriever_with(conn, provider, EngramConfig::default());

    retriever.retrieve("first query about a and b").await;

    assert_eq!(activation_of(&store, 1), 0.5);
    assert_eq!(activation_of(&store, 2), 0.5);
    assert_eq!(edge_weight(&store, 1, 2), Some(1.0));
    assert_eq!(edge_weight(&store, 2, 1), Some(1.0));

    retriever.retrieve("second query about a and b").await;

    assert_eq!(activation_of(&store, 1), 1.0);
    assert_eq!(edge_weight(&store, 1, 2), Some(2.0));
    assert_eq!(edge_weight(&store, 2, 1), Some(2.0));
}

#[tokio::test]
async fn expansion_pulls_in_co_occurring_facts_at_reduced_bump() {
    let mut conn = test_db();
    seed_fact(&conn, 1, "marcus", "employer", "acme");
    seed_fact(&conn, 3, "acme", "city", "lisbon");

    // Facts 1 and 3 were retrieved together twice in the past, so the
    // summed edge weight (2.0) meets the default expansion floor.
    reinforce(&mut conn, &[1, 3]).unwrap();
    reinforce(&mut conn, &[1, 3]).unwrap();

    let provider = StaticProvider {
        hits: vec![hit("marcus", "employer", "acme", 85.0, Some(1))],
    };
    let (retriever, store) = retriever_with(conn, provider, EngramConfig::default());

    let context = retriever.retrieve("where does marcus work").await;

    assert_eq!(context.linked.len(), 1);
    assert_eq!(context.linked[0].id, 3);
    assert_eq!(context.linked[0].total_weight, 2.0);

    let block = context.render();
    assert!(block.contains("• acme.city = lisbon [linked]"));

    // expansion bump is 30% of the primary bump
    assert_eq!(activation_of(&store, 1), 0.5);
    assert!((activation_of(&store, 3) - 0.15).abs() < 1e-9);
}

#[tokio::test]
async fn weak_edges_do_not_qualify_for_expansion() {
    let mut conn = test_db();
    seed_fact(&conn, 1, "a", "k", "v");
    seed_fact(&conn, 3, "c", "k", "v");
    reinforce(&mut conn, &[1, 3]).unwrap(); // weight 1.0 < floor of 2.0

    let provider = StaticProvider {
        hits: vec![hit("a", "k", "v", 85.0, Some(1))],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    let context = retriever.retrieve("query about a").await;
    assert!(context.linked.is_empty());
}

#[tokio::test]
async fn results_truncate_to_max_results_before_learning() {
    let conn = test_db();
    for id in 1..=10 {
        seed_fact(&conn, id, &format!("e{id}"), "k", "v");
    }

    let hits = (1..=10)
        .map(|id| hit(&format!("e{id}"), "k", "v", 95.0 - id as f64, Some(id)))
        .collect();
    let (retriever, store) =
        retriever_with(conn, StaticProvider { hits }, EngramConfig::default());

    let context = retriever.retrieve("a broad query").await;

    assert_eq!(context.primary.len(), 8);
    // facts beyond the top-K take no part in learning
    assert_eq!(activation_of(&store, 1), 0.5);
    assert_eq!(activation_of(&store, 9), 0.0);
    assert_eq!(activation_of(&store, 10), 0.0);
}

#[tokio::test]
async fn provider_failure_degrades_to_empty_result() {
    let conn = test_db();
    seed_fact(&conn, 1, "a", "k", "v");

    let (retriever, store) = retriever_with(conn, FailingProvider, EngramConfig::default());

    let context = retriever.retrieve("a perfectly good query").await;

    assert!(context.is_empty());
    // no learning happened on the failure path
    assert_eq!(activation_of(&store, 1), 0.0);
}

#[tokio::test]
async fn slow_provider_is_timed_out_to_empty_result() {
    let conn = test_db();
    let mut config = EngramConfig::default();
    config.search.timeout_ms = 20;

    let provider = SlowProvider {
        delay_ms: 500,
        hits: vec![hit("a", "k", "v", 90.0, None)],
    };
    let (retriever, _store) = retriever_with(conn, provider, config);

    let context = retriever.retrieve("query that will time out").await;
    assert!(context.is_empty());
}

#[tokio::test]
async fn storeless_retriever_ranks_by_relevance_alone() {
    let provider = StaticProvider {
        hits: vec![
            hit("a", "k", "v", 70.0, Some(1)),
            hit("b", "k", "v", 90.0, Some(2)),
        ],
    };
    let retriever = storeless_retriever(provider, EngramConfig::default());

    let context = retriever.retrieve("query without a store").await;

    assert_eq!(context.primary.len(), 2);
    assert_eq!(context.primary[0].hit.entity, "b");
    assert!(context.primary[0].activation.is_none());
    assert!(context.linked.is_empty());
}

#[tokio::test]
async fn short_query_never_reaches_the_provider() {
    let conn = test_db();
    let provider = StaticProvider {
        hits: vec![hit("a", "k", "v", 90.0, None)],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    // if the provider were consulted, the hit would come back
    assert!(retriever.retrieve("hey").await.is_empty());
    assert!(retriever.retrieve("").await.is_empty());
}

#[tokio::test]
async fn echoed_context_block_does_not_feed_back() {
    let conn = test_db();
    let provider = StaticProvider {
        hits: vec![hit("a", "k", "v", 90.0, None)],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    let echoed = "[GRAPH MEMORY]\n• a.k = v\n• b.k = w";
    assert!(retriever.retrieve(echoed).await.is_empty());
}

#[tokio::test]
async fn rendered_block_groups_and_deduplicates() {
    let conn = test_db();
    let provider = StaticProvider {
        hits: vec![
            hit("marcus", "employer", "acme", 90.0, None),
            hit("acme", "city", "lisbon", 85.0, None),
            hit("marcus", "employer", "acme", 70.0, None), // duplicate answer
            hit("marcus", "role", "engineer", 66.0, None),
        ],
    };
    let (retriever, _store) = retriever_with(conn, provider, EngramConfig::default());

    let block = retriever.retrieve_block("tell me about marcus").await;

    let expected = "[GRAPH MEMORY]\n\
                    • marcus.employer = acme\n\
                    • marcus.role = engineer\n\
                    • acme.city = lisbon";
    assert_eq!(block, expected);
}
