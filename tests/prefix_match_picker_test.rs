mod common;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use common::pod_endpoints;
use sgl_picker::{
    config::PickerConfig,
    policies::{chunk_and_hash, PickRequest, Picker, PickerFactory, PrefixMatchPicker},
    protocols::RoutingRequest,
};

fn long_prompt(seed: &str, len: usize) -> String {
    let mut prompt = seed.to_string();
    while prompt.len() < len {
        prompt.push('x');
    }
    prompt
}

#[tokio::test]
async fn test_repeated_prompt_is_sticky() {
    let picker = PrefixMatchPicker::new();
    let endpoints = pod_endpoints(&[1, 2, 3, 4]);
    let prompt = long_prompt("You are a helpful assistant. ", 400);
    let req = PickRequest::new("m", &prompt);

    let first = picker.pick(&endpoints, &req).await.unwrap();
    for _ in 0..20 {
        assert_eq!(picker.pick(&endpoints, &req).await, Some(first));
    }
}

#[tokio::test]
async fn test_shared_system_prompt_follows_first_endpoint() {
    let picker = PrefixMatchPicker::new();
    let endpoints = pod_endpoints(&[1, 2, 3]);
    let system = long_prompt("system: answer in french. ", 256);

    let first_prompt = format!("{}question one", system);
    let first = picker
        .pick(&endpoints, &PickRequest::new("m", &first_prompt))
        .await
        .unwrap();

    // Same first two chunks, different tail
    let second_prompt = format!("{}a rather different question", system);
    let second = picker
        .pick(&endpoints, &PickRequest::new("m", &second_prompt))
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_fresh_picker_spreads_uniformly() {
    let endpoints = pod_endpoints(&[1, 2, 3, 4]);
    let mut counts: HashMap<String, usize> = HashMap::new();

    for _ in 0..400 {
        let picker = PrefixMatchPicker::new();
        let idx = picker
            .pick(&endpoints, &PickRequest::new("m", "same prompt every time"))
            .await
            .unwrap();
        *counts.entry(endpoints[idx].name().to_string()).or_default() += 1;
    }

    assert_eq!(counts.len(), 4);
    for count in counts.values() {
        assert!(*count > 50, "skewed distribution: {:?}", counts);
    }
}

#[tokio::test]
async fn test_disjoint_prompt_matches_every_seen_endpoint() {
    let picker = PrefixMatchPicker::new();
    let endpoints = pod_endpoints(&[1, 2, 3]);

    // Offer one endpoint at a time so each one lands on the root
    for (i, endpoint) in endpoints.iter().enumerate() {
        let prompt = format!("warmup prompt number {}", i);
        let only = vec![Arc::clone(endpoint)];
        assert_eq!(
            picker.pick(&only, &PickRequest::new("m", &prompt)).await,
            Some(0)
        );
    }

    let available: HashSet<&str> = endpoints.iter().map(|e| e.url()).collect();
    let matched = picker
        .trie()
        .longest_prefix_match("nothing like the warmup", &available);
    assert_eq!(matched, available);
}

#[tokio::test]
async fn test_removed_endpoint_is_never_picked() {
    let picker = PrefixMatchPicker::new();
    let all = pod_endpoints(&[1, 2, 3]);
    let prompt = long_prompt("sticky ", 300);
    let req = PickRequest::new("m", &prompt);

    let first = picker.pick(&all, &req).await.unwrap();
    let removed = all[first].url().to_string();

    let remaining: Vec<_> = all
        .iter()
        .filter(|e| e.url() != removed)
        .cloned()
        .collect();
    for _ in 0..10 {
        let idx = picker.pick(&remaining, &req).await.unwrap();
        assert_ne!(remaining[idx].url(), removed);
    }
}

#[test]
fn test_chunking_is_byte_based() {
    let prompt = long_prompt("", 300);
    let hashes = chunk_and_hash(&prompt, 128);
    assert_eq!(hashes.len(), 3);
    // The two full chunks are identical bytes
    assert_eq!(hashes[0], hashes[1]);
    assert_ne!(hashes[1], hashes[2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_picks_keep_trie_consistent() {
    let picker = Arc::new(PrefixMatchPicker::new());
    let endpoints = Arc::new(pod_endpoints(&[1, 2, 3, 4]));

    let mut handles = Vec::new();
    for i in 0..100 {
        let picker = Arc::clone(&picker);
        let endpoints = Arc::clone(&endpoints);
        handles.push(tokio::spawn(async move {
            let prompt = long_prompt(&format!("{:04}", i), 300);
            let req = PickRequest::new("m", &prompt);
            let first = picker.pick(&endpoints, &req).await.unwrap();
            let again = picker.pick(&endpoints, &req).await.unwrap();
            (first, again)
        }));
    }

    for handle in handles {
        let (first, again) = handle.await.unwrap();
        assert_eq!(first, again);
    }
    // Three chunks per prompt, all paths distinct from the first chunk on
    assert_eq!(picker.trie().node_count(), 300);
}

#[tokio::test]
async fn test_picker_from_json_config() {
    let config = PickerConfig::from_json(r#"{"type": "prefixmatch", "chunk_size": 8}"#).unwrap();
    let picker = PickerFactory::create_from_config(&config).unwrap();
    assert_eq!(picker.name(), "prefixmatch");
    assert!(picker.needs_request_text());

    let endpoints = pod_endpoints(&[1, 2]);
    let request = RoutingRequest::text("m", "a prompt longer than one chunk");
    let prompt = request.prompt();
    let req = PickRequest::new(&request.model, &prompt);

    let first = picker.pick(&endpoints, &req).await.unwrap();
    assert_eq!(picker.pick(&endpoints, &req).await, Some(first));

    let prefix_picker = picker
        .as_any()
        .downcast_ref::<PrefixMatchPicker>()
        .unwrap();
    assert_eq!(prefix_picker.trie().chunk_size(), 8);
    // 30 bytes in 8-byte chunks
    assert_eq!(prefix_picker.trie().node_count(), 4);

    picker.reset();
    assert!(prefix_picker.trie().is_empty());
}
