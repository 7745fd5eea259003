use proptest::prelude::*;


pub(crate) fn simple_number_strategy() -> impl Strategy<Value = String> {
    (0u32..=1000).prop_map(|n| n.to_string())
}

pub(crate) fn simple_dice_strategy() -> impl Strategy<Value = String> {
    (1u32..=20, 1u32..=100)
        .prop_map(|(count, sides)| format!("{}d{}", count, sides))
}

pub(crate) fn dice_with_modifier_strategy() -> impl Strategy<Value = String> {
    (
        1u32..=20,
        1u32..=100,
        prop_oneof!["kh", "kl", "dh", "dl", "k", "d"],
        0u32..=20,
        prop_oneof!["", "!", "!!"]
    ).prop_map(|(count, sides, modifier, n, explode)| {
        format!("{}d{}{}{}{}", count, sides, modifier, n, explode)
    })
}

pub(crate) fn factor_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        simple_number_strategy(),
        simple_dice_strategy(),
        dice_with_modifier_strategy(),
    ]
}

/// Factors joined by ` + `, ` - `, ` * ` or ` / `, as a user would type them.
pub(crate) fn sum_query_strategy() -> impl Strategy<Value = String> {
    (
        factor_strategy(),
        prop::collection::vec((prop_oneof![Just("+"), Just("-"), Just("*"), Just("/")], factor_strategy()), 0..6)
    ).prop_map(|(head, tail)| {
        tail.into_iter()
            .fold(head, |query, (op, factor)| format!("{} {} {}", query, op, factor))
    })
}
