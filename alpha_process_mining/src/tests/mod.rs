use chrono::{DateTime, Duration, FixedOffset};

use crate::{
    check_fitness, discover, discover_with_config, discover_with_statistics, AlphaMinerConfig,
    DiscoveryError, Event, EventLog, PetriNet,
};

/// Install a logger for tests (only the first call has an effect)
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn base_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-03-01T08:00:00+01:00").unwrap()
}

/// Event log with one case per `(case_id, activities)` entry; events get increasing timestamps
pub(crate) fn log_from_sequences(cases: &[(&str, &[&str])]) -> EventLog {
    let mut log = EventLog::new();
    for (case_id, acts) in cases {
        for (i, act) in acts.iter().enumerate() {
            log.add_event(
                *case_id,
                Event::new(*act, base_time() + Duration::minutes(i as i64)),
            );
        }
    }
    log
}

/// `c1: [A, B, D]`, `c2: [A, C, D]`
pub(crate) fn clean_log() -> EventLog {
    log_from_sequences(&[("c1", &["A", "B", "D"]), ("c2", &["A", "C", "D"])])
}

/// `c3: [A, D]`
pub(crate) fn noisy_log() -> EventLog {
    log_from_sequences(&[("c3", &["A", "D"])])
}

fn net_structure(pn: &PetriNet) -> (Vec<String>, Vec<String>, Vec<String>) {
    let places = pn.places().iter().map(|p| p.name.clone()).collect();
    let transitions = pn.transitions().iter().map(|t| t.label.clone()).collect();
    let arcs = pn.arcs().map(|arc| format!("{arc:?}")).collect();
    (places, transitions, arcs)
}

#[test]
pub fn test_clean_example() {
    init_logger();
    let log = clean_log();
    let net = discover(&log).unwrap();
    let places: Vec<&str> = net.places().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(places, vec!["start", "({A},{B,C})", "({B,C},{D})", "end"]);

    let start = net.start_place().unwrap();
    let end = net.end_place().unwrap();
    let a = net.transition_by_label("A").unwrap();
    let d = net.transition_by_label("D").unwrap();
    assert_eq!(net.preset_of_transition(a), &[start]);
    assert_eq!(net.postset_of_transition(d), &[end]);
    assert_eq!(net.label_of(a), Some("A"));
    assert!(!net.contains_duplicate_labels());

    assert_eq!(check_fitness(&log, &net).unwrap(), 1.0);
}

#[test]
pub fn test_noisy_example() {
    init_logger();
    let net = discover(&clean_log()).unwrap();
    let fitness = check_fitness(&noisy_log(), &net).unwrap();
    assert!(fitness < 1.0);
    assert_eq!(fitness, 0.5);
}

#[test]
pub fn test_discovery_is_deterministic() {
    let cases: Vec<(&str, &[&str])> = vec![
        ("1", &["a", "b", "c", "e"][..]),
        ("2", &["a", "c", "b", "e"][..]),
        ("3", &["a", "d", "e"][..]),
        ("4", &["a", "d", "f", "e"][..]),
        ("5", &["a", "b", "c", "f", "e"][..]),
    ];
    let first = net_structure(&discover(&log_from_sequences(&cases)).unwrap());
    // Case insertion order must not matter
    let mut reversed = cases.clone();
    reversed.reverse();
    for _ in 0..5 {
        assert_eq!(
            net_structure(&discover(&log_from_sequences(&cases)).unwrap()),
            first
        );
        assert_eq!(
            net_structure(&discover(&log_from_sequences(&reversed)).unwrap()),
            first
        );
    }
}

#[test]
pub fn test_self_fitness() {
    init_logger();
    for cases in [
        vec![("1", &["a", "b", "c", "d"][..]), ("2", &["a", "c", "b", "d"][..])],
        vec![
            ("1", &["a", "b", "d"][..]),
            ("2", &["a", "c", "d"][..]),
            ("3", &["a", "b", "d"][..]),
        ],
        vec![("1", &["x", "y", "z"][..])],
    ] {
        let log = log_from_sequences(&cases);
        let net = discover(&log).unwrap();
        assert_eq!(check_fitness(&log, &net).unwrap(), 1.0, "{cases:?}");
    }
}

#[test]
pub fn test_unordered_events_are_sorted() {
    let mut log = EventLog::new();
    // Inserted out of order: D happens last
    log.add_event("c1", Event::new("D", base_time() + Duration::minutes(2)));
    log.add_event("c1", Event::new("A", base_time()));
    log.add_event("c1", Event::new("B", base_time() + Duration::minutes(1)));
    log.add_event("c2", Event::new("A", base_time()));
    log.add_event("c2", Event::new("C", base_time() + Duration::minutes(1)));
    log.add_event("c2", Event::new("D", base_time() + Duration::minutes(2)));
    assert_eq!(
        net_structure(&discover(&log).unwrap()),
        net_structure(&discover(&clean_log()).unwrap())
    );
}

#[test]
pub fn test_empty_log() {
    let net = discover(&EventLog::new()).unwrap();
    assert_eq!(net.places().len(), 2);
    assert!(net.transitions().is_empty());
    assert_eq!(check_fitness(&EventLog::new(), &net).unwrap(), 1.0);
}

#[test]
pub fn test_too_many_activities() {
    let acts: Vec<String> = (0..21).map(|i| format!("activity {i:02}")).collect();
    let acts: Vec<&str> = acts.iter().map(String::as_str).collect();
    let log = log_from_sequences(&[("1", acts.as_slice())]);
    let err = discover(&log).unwrap_err();
    assert_eq!(
        err,
        DiscoveryError::TooManyActivities {
            found: 21,
            limit: 20
        }
    );
    assert_eq!(
        err.to_string(),
        "Log contains 21 distinct activities, but at most 20 are allowed"
    );
    let net = discover_with_config(&log, &AlphaMinerConfig { max_activities: 21 }).unwrap();
    assert_eq!(net.transitions().len(), 21);
}

#[test]
pub fn test_statistics() {
    let (net, stats) =
        discover_with_statistics(&clean_log(), &AlphaMinerConfig::default()).unwrap();
    assert_eq!(stats.num_maximal_candidates, net.places().len() - 2);
    let json = stats.to_json().unwrap();
    assert!(json.contains("\"num_candidates\":6"));
}
