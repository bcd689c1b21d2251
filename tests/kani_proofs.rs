#![cfg(kani)]
//! Kani proof harnesses for the flowgate selection model.
//!
//! These harnesses verify core invariants of transition selection using a
//! model that mirrors the semantics of `next_transition` without `String`,
//! `Value` enums, or recursive condition trees.
//!
//! Model:
//! - Each candidate transition carries a priority (0..3), an optional
//!   single-rule gate, and a default flag.
//! - A gate compares `field_values[gate_field] op threshold` when the field
//!   is present; binary comparisons on absent fields fail closed.
//! - Unary presence checks (is_empty / is_not_empty) look only at presence.
//! - Non-defaults are scanned in insertion order; the first one carrying
//!   the highest priority among the matches wins.
//! - If no non-default matches, the first default wins unconditionally.
//!
//! Run with: `cargo kani --tests --harness <harness_name>`

/// Maximum number of transitions / fields for bounded proofs.
const MAX_N: usize = 8;

/// Binary comparison operators encoded as 0..4.
fn compare_op(lhs: i64, op: u8, rhs: i64) -> bool {
    match op {
        0 => lhs == rhs,
        1 => lhs != rhs,
        2 => lhs > rhs,
        _ => lhs < rhs,
    }
}

/// Evaluate one gate. Operators 0..4 are binary comparisons and fail
/// closed when the field is absent; 4 is is_empty, 5 is is_not_empty.
fn model_gate(
    field_present: bool,
    field_value: i64,
    op: u8,
    threshold: i64,
) -> bool {
    match op {
        4 => !field_present,
        5 => field_present,
        _ => field_present && compare_op(field_value, op, threshold),
    }
}

/// Select the next transition, returning its index and the per-candidate
/// match results.
///
/// `priority[i]`: priority of transition i (0 low, 1 normal, 2 high)
/// `gated[i]`: whether transition i carries a gate
/// `gate_field[i]`: which field the gate reads (index into field_values)
/// `gate_op[i]`: gate operator for transition i (0..6)
/// `gate_threshold[i]`: RHS value for transition i's comparison
/// `is_default[i]`: default flag of transition i
/// `field_present[f]`: whether field f has a value in the context
fn model_select(
    n: usize,
    priority: &[u8; MAX_N],
    gated: &[bool; MAX_N],
    gate_field: &[usize; MAX_N],
    gate_op: &[u8; MAX_N],
    gate_threshold: &[i64; MAX_N],
    is_default: &[bool; MAX_N],
    field_values: &[i64; MAX_N],
    field_present: &[bool; MAX_N],
) -> (Option<usize>, [bool; MAX_N]) {
    let mut matched = [false; MAX_N];

    // Evaluate every gate up front; ungated candidates always match.
    let mut i: usize = 0;
    while i < n {
        matched[i] = if gated[i] {
            model_gate(
                field_present[gate_field[i]],
                field_values[gate_field[i]],
                gate_op[i],
                gate_threshold[i],
            )
        } else {
            true
        };
        i += 1;
    }

    // First non-default with the highest priority wins. Replacing the
    // winner only on a strictly greater priority keeps insertion order
    // for ties.
    let mut winner: Option<usize> = None;
    let mut i: usize = 0;
    while i < n {
        if !is_default[i] && matched[i] {
            let better = match winner {
                None => true,
                Some(w) => priority[i] > priority[w],
            };
            if better {
                winner = Some(i);
            }
        }
        i += 1;
    }

    // Fall back to the first default, which fires unconditionally.
    if winner.is_none() {
        let mut i: usize = 0;
        while i < n {
            if is_default[i] {
                winner = Some(i);
                break;
            }
            i += 1;
        }
    }

    (winner, matched)
}

// ---------------------------------------------------------------------------
// Proof 1: Panic freedom
//
// The model selection function never panics for any valid inputs up to
// MAX_N transitions and fields.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn panic_freedom() {
    let n: usize = kani::any();
    kani::assume(n >= 1 && n <= MAX_N);
    let n_fields: usize = kani::any();
    kani::assume(n_fields >= 1 && n_fields <= MAX_N);

    let priority: [u8; MAX_N] = kani::any();
    let gated: [bool; MAX_N] = kani::any();
    let gate_field: [usize; MAX_N] = kani::any();
    let gate_op: [u8; MAX_N] = kani::any();
    let gate_threshold: [i64; MAX_N] = kani::any();
    let is_default: [bool; MAX_N] = kani::any();
    let field_values: [i64; MAX_N] = kani::any();
    let field_present: [bool; MAX_N] = kani::any();

    // Constrain validity
    let mut i: usize = 0;
    while i < n {
        kani::assume(priority[i] < 3);
        kani::assume(gate_op[i] < 6);
        kani::assume(gate_field[i] < n_fields);
        i += 1;
    }

    let _ = model_select(
        n,
        &priority,
        &gated,
        &gate_field,
        &gate_op,
        &gate_threshold,
        &is_default,
        &field_values,
        &field_present,
    );
}

// ---------------------------------------------------------------------------
// Proof 2: Determinism
//
// Selecting twice from the same inputs always returns the same result.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn determinism() {
    let n: usize = kani::any();
    kani::assume(n >= 1 && n <= 4);
    let n_fields: usize = kani::any();
    kani::assume(n_fields >= 1 && n_fields <= 4);

    let priority: [u8; MAX_N] = kani::any();
    let gated: [bool; MAX_N] = kani::any();
    let gate_field: [usize; MAX_N] = kani::any();
    let gate_op: [u8; MAX_N] = kani::any();
    let gate_threshold: [i64; MAX_N] = kani::any();
    let is_default: [bool; MAX_N] = kani::any();
    let field_values: [i64; MAX_N] = kani::any();
    let field_present: [bool; MAX_N] = kani::any();

    let mut i: usize = 0;
    while i < n {
        kani::assume(priority[i] < 3);
        kani::assume(gate_op[i] < 6);
        kani::assume(gate_field[i] < n_fields);
        i += 1;
    }

    let (w1, m1) = model_select(
        n,
        &priority,
        &gated,
        &gate_field,
        &gate_op,
        &gate_threshold,
        &is_default,
        &field_values,
        &field_present,
    );
    let (w2, m2) = model_select(
        n,
        &priority,
        &gated,
        &gate_field,
        &gate_op,
        &gate_threshold,
        &is_default,
        &field_values,
        &field_present,
    );

    // Same winner
    match (w1, w2) {
        (None, None) => {}
        (Some(a), Some(b)) => kani::assert(a == b, "winner index must match"),
        _ => kani::assert(false, "Some/None mismatch"),
    }

    // Same match results
    let mut k: usize = 0;
    while k < n {
        kani::assert(m1[k] == m2[k], "match results must match");
        k += 1;
    }
}

// ---------------------------------------------------------------------------
// Proof 3: Priority ordering
//
// A winning non-default always carries the highest priority among all
// matched non-defaults, and ties fall to the earliest insertion index.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn priority_ordering() {
    let n: usize = kani::any();
    kani::assume(n >= 1 && n <= 4);
    let n_fields: usize = kani::any();
    kani::assume(n_fields >= 1 && n_fields <= 4);

    let priority: [u8; MAX_N] = kani::any();
    let gated: [bool; MAX_N] = kani::any();
    let gate_field: [usize; MAX_N] = kani::any();
    let gate_op: [u8; MAX_N] = kani::any();
    let gate_threshold: [i64; MAX_N] = kani::any();
    let is_default: [bool; MAX_N] = kani::any();
    let field_values: [i64; MAX_N] = kani::any();
    let field_present: [bool; MAX_N] = kani::any();

    let mut i: usize = 0;
    while i < n {
        kani::assume(priority[i] < 3);
        kani::assume(gate_op[i] < 6);
        kani::assume(gate_field[i] < n_fields);
        i += 1;
    }

    let (winner, matched) = model_select(
        n,
        &priority,
        &gated,
        &gate_field,
        &gate_op,
        &gate_threshold,
        &is_default,
        &field_values,
        &field_present,
    );

    if let Some(w) = winner {
        if !is_default[w] {
            let mut j: usize = 0;
            while j < n {
                if !is_default[j] && matched[j] {
                    kani::assert(
                        priority[j] <= priority[w],
                        "matched candidate outranks the winner",
                    );
                    if priority[j] == priority[w] {
                        kani::assert(j >= w, "tie broken against insertion order");
                    }
                }
                j += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Proof 4: Default fallback and fail-closed gates
//
// The default wins exactly when no non-default matched, selection is
// empty only when there is no default either, and a binary comparison
// on an absent field never matches.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(10)]
fn default_fallback() {
    let n: usize = kani::any();
    kani::assume(n >= 1 && n <= 4);
    let n_fields: usize = kani::any();
    kani::assume(n_fields >= 1 && n_fields <= 4);

    let priority: [u8; MAX_N] = kani::any();
    let gated: [bool; MAX_N] = kani::any();
    let gate_field: [usize; MAX_N] = kani::any();
    let gate_op: [u8; MAX_N] = kani::any();
    let gate_threshold: [i64; MAX_N] = kani::any();
    let is_default: [bool; MAX_N] = kani::any();
    let field_values: [i64; MAX_N] = kani::any();
    let field_present: [bool; MAX_N] = kani::any();

    let mut i: usize = 0;
    while i < n {
        kani::assume(priority[i] < 3);
        kani::assume(gate_op[i] < 6);
        kani::assume(gate_field[i] < n_fields);
        i += 1;
    }

    let (winner, matched) = model_select(
        n,
        &priority,
        &gated,
        &gate_field,
        &gate_op,
        &gate_threshold,
        &is_default,
        &field_values,
        &field_present,
    );

    let mut any_non_default_matched = false;
    let mut any_default = false;
    let mut j: usize = 0;
    while j < n {
        if !is_default[j] && matched[j] {
            any_non_default_matched = true;
        }
        if is_default[j] {
            any_default = true;
        }
        // Binary comparisons fail closed on absent fields.
        if gated[j] && gate_op[j] < 4 && !field_present[gate_field[j]] {
            kani::assert(!matched[j], "binary gate matched an absent field");
        }
        j += 1;
    }

    match winner {
        Some(w) if is_default[w] => {
            kani::assert(!any_non_default_matched, "default won over a match")
        }
        Some(_) => kani::assert(any_non_default_matched, "non-default won without a match"),
        None => kani::assert(
            !any_non_default_matched && !any_default,
            "empty selection despite a viable candidate",
        ),
    }
}
