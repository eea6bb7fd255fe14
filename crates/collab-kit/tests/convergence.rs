//! Replicas that have seen the same writes converge regardless of merge order.

use collab_kit::prelude::*;

fn fixed() -> u64 {
    42
}

#[test]
fn registers_written_by_three_participants_converge() {
    let mut clocks: Vec<HybridClock> = (1..=3)
        .map(|node| HybridClock::with_time_source(node, fixed))
        .collect();

    let seed = LwwRegister::new(1_i64, clocks[0].now());
    let mut a = seed.clone();
    let mut b = seed.clone();
    let mut c = seed;

    a.set(3, clocks[0].now());
    b.set(5, clocks[1].now());
    c.set(6, clocks[2].now());

    let mut order1 = a.clone();
    order1.merge(&b);
    order1.merge(&c);

    let mut order2 = c.clone();
    order2.merge(&a);
    order2.merge(&b);

    let mut order3 = b.clone();
    order3.merge(&c);
    order3.merge(&a);

    assert_eq!(order1, order2);
    assert_eq!(order2, order3);
}

#[test]
fn write_after_observing_remote_wins() {
    let mut owner = HybridClock::with_time_source(1, fixed);
    let mut guest = HybridClock::with_time_source(2, fixed);

    let mut owner_reg = LwwRegister::new(0.0_f64, owner.now());
    for _ in 0..10 {
        owner_reg.set(owner_reg.value() + 0.01, owner.now());
    }

    let mut guest_reg = owner_reg.clone();
    guest.receive(&owner_reg.timestamp());
    guest_reg.set(9.0, guest.now());

    owner_reg.merge(&guest_reg);
    assert_eq!(*owner_reg.value(), 9.0);
}

#[test]
fn whole_text_replacements_from_two_participants_converge() {
    let mut alice = TextCrdt::new("alice");
    alice.insert_str(0, "shared").unwrap();
    let mut bob = alice.fork("bob");

    let len = alice.len();
    alice.replace_range(0, len, "alice typed").unwrap();
    let len = bob.len();
    bob.replace_range(0, len, "bob typed").unwrap();

    let mut left = alice.clone();
    left.merge(&bob);
    let mut right = bob.clone();
    right.merge(&alice);

    assert_eq!(left.to_string(), right.to_string());
    assert!(!left.to_string().contains("shared"));
}

#[test]
fn relayed_patches_converge_with_full_state() {
    let mut alice = TextCrdt::new("alice");
    let mut bob = TextCrdt::new("bob");
    let mut relay = TextCrdt::new("relay");

    let mut typed = String::new();
    for ch in "roll".chars() {
        typed.push(ch);
        let len = alice.len();
        let patch = alice.replace_range(0, len, &typed).unwrap();
        bob.apply_patch(&patch).unwrap();
        relay.apply_patch(&patch).unwrap();
    }
    let len = bob.len();
    let patch = bob.replace_range(0, len, "rolled").unwrap();
    alice.apply_patch(&patch).unwrap();
    relay.apply_patch(&patch).unwrap();

    let mut merged = TextCrdt::new("late");
    merged.merge(&relay);
    for replica in [&alice, &bob, &relay, &merged] {
        assert_eq!(replica.to_string(), "rolled");
        assert_eq!(replica.slot_count(), 6);
    }
}

#[test]
fn text_state_survives_serialization() {
    let mut t = TextCrdt::new("alice");
    t.insert_str(0, "roll the dice").unwrap();
    t.remove_range(0, 5).unwrap();

    let json = serde_json::to_string(&t).unwrap();
    let back: TextCrdt = serde_json::from_str(&json).unwrap();
    assert_eq!(back, t);
    assert_eq!(back.to_string(), "the dice");
}
