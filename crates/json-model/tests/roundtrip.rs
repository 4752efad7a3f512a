mod common;

use common::{hash_of, init_tracing, Person};
use json_model::{Document, EditOutcome, JsonModel, WriteOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEEDS: [u64; 6] = [1, 7, 42, 1234, 0xBEEF, 0x5EED_CAFE];

const NAMES: [&str; 8] = ["Ada", "Grace", "Alan", "Edsger", "Barbara", "Ken", "Zoë", "a/b"];

fn random_person(rng: &mut StdRng, depth: usize) -> Person {
    let person = Person::named(
        NAMES[rng.gen_range(0..NAMES.len())],
        NAMES[rng.gen_range(0..NAMES.len())],
    );
    match rng.gen_range(0..3) {
        0 => {}
        1 => person.age().set(None),
        _ => person.age().set(rng.gen_range(0..120_i64)),
    }
    if depth > 0 {
        if rng.gen_bool(0.5) {
            person.relative().set(random_person(rng, depth - 1));
        }
        for _ in 0..rng.gen_range(0..3) {
            person.children().append([random_person(rng, depth - 1)]);
        }
    }
    person
}

fn mutate(person: &Person, rng: &mut StdRng) {
    match rng.gen_range(0..4) {
        0 => person.first_name().set(format!("renamed-{}", rng.gen::<u16>())),
        1 => person.age().set(rng.gen_range(200..300_i64)),
        2 => person.children().append([Person::named("New", "Child")]),
        _ => match person.relative().get() {
            Some(relative) => relative.last_name().set("Changed".to_owned()),
            None => person.relative().set(Person::named("Fresh", "Relative")),
        },
    }
}

#[test]
fn text_round_trip_preserves_content() {
    init_tracing();
    for seed in SEEDS {
        let person = random_person(&mut StdRng::seed_from_u64(seed), 3);
        for options in [WriteOptions::default(), WriteOptions::pretty()] {
            let text = person.model().to_json_string_with(&options).unwrap();
            let parsed = Person::from_json_str(&text).unwrap();
            assert_eq!(parsed, person, "seed {seed}");
            assert_eq!(hash_of(&parsed), hash_of(&person), "seed {seed}");
            assert_eq!(parsed.json(), person.json(), "seed {seed}");
        }
    }
}

#[test]
fn typed_reads_agree_after_round_trip() {
    init_tracing();
    for seed in SEEDS {
        let person = random_person(&mut StdRng::seed_from_u64(seed), 2);
        let parsed = Person::from_json_str(&person.json()).unwrap();
        assert_eq!(parsed.first_name().get(), person.first_name().get());
        assert_eq!(parsed.age().get(), person.age().get());
        assert_eq!(parsed.age().state(), person.age().state());
        assert_eq!(parsed.relative().get(), person.relative().get());
        assert_eq!(parsed.children().to_vec(), person.children().to_vec());
    }
}

#[test]
fn copies_are_detached() {
    init_tracing();
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let person = random_person(&mut rng, 2);
        let copy = Person::copy_of(&person);
        assert_eq!(copy, person);
        assert!(!copy.model().shares_store_with(person.model()));

        mutate(&copy, &mut rng);
        assert_ne!(copy, person, "seed {seed}");
    }
}

#[test]
fn rollback_restores_random_edits() {
    init_tracing();
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let person = random_person(&mut rng, 2);
        let before = person.json();

        person.model().begin_edit();
        for _ in 0..rng.gen_range(1..5) {
            mutate(&person, &mut rng);
        }
        assert_eq!(person.model().end_edit(false), EditOutcome::RolledBack, "seed {seed}");
        assert_eq!(person.json(), before, "seed {seed}");
    }
}

#[test]
fn from_store_matches_source() {
    init_tracing();
    let person = random_person(&mut StdRng::seed_from_u64(99), 2);
    let clone = JsonModel::from_store(&person.model().store());
    assert_eq!(&clone, person.model());
    assert!(!clone.shares_store_with(person.model()));
}
