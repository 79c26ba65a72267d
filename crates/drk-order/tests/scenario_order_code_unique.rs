//! Scenario: generated order codes never collide while capacity remains.
//!
//! GREEN when:
//! - 1000 sequential generations against a growing "taken" set yield 1000
//!   distinct 3-digit codes
//! - the 1001st generation fails with CodeSpaceExhausted instead of looping
//! - an adversarial source that always proposes the same code still
//!   terminates with a free code

use std::collections::HashSet;

use drk_order::{generate_code, CodeError, CodeSource, OrderCode, UuidCodeSource, CODE_SPACE};

/// Always proposes the same candidate.
struct Stuck(u16);

impl CodeSource for Stuck {
    fn next_candidate(&mut self) -> u16 {
        self.0
    }
}

/// Small deterministic LCG so failures are reproducible.
struct Lcg(u32);

impl CodeSource for Lcg {
    fn next_candidate(&mut self) -> u16 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (self.0 >> 16) as u16
    }
}

fn fill_all<S: CodeSource>(src: &mut S) -> HashSet<OrderCode> {
    let mut taken = HashSet::new();
    for i in 0..CODE_SPACE {
        let code = generate_code(src, |c| taken.contains(&c))
            .unwrap_or_else(|e| panic!("generation {i} failed early: {e}"));
        assert!(taken.insert(code), "code {code} generated twice");
    }
    taken
}

#[test]
fn thousand_codes_are_distinct_with_uuid_source() {
    let taken = fill_all(&mut UuidCodeSource);
    assert_eq!(taken.len(), usize::from(CODE_SPACE));
    assert!(taken.iter().all(|c| c.to_string().len() == 3));
}

#[test]
fn thousand_codes_are_distinct_with_seeded_source() {
    let taken = fill_all(&mut Lcg(7));
    assert_eq!(taken.len(), usize::from(CODE_SPACE));
}

#[test]
fn exhausted_space_is_reported() {
    let mut src = Lcg(99);
    let taken = fill_all(&mut src);
    let err = generate_code(&mut src, |c| taken.contains(&c)).unwrap_err();
    assert_eq!(err, CodeError::CodeSpaceExhausted);
}

#[test]
fn stuck_source_still_finds_the_free_code() {
    let free = OrderCode::new(500).unwrap();
    let code = generate_code(&mut Stuck(123), |c| c != free).unwrap();
    assert_eq!(code, free);
}

#[test]
fn first_untaken_candidate_is_used() {
    let code = generate_code(&mut Stuck(42), |_| false).unwrap();
    assert_eq!(code.to_string(), "042");
}
