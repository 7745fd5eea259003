use proptest::prelude::*;
use crate::roll::{DiceTerm, FaceSource, Mode};


/// Replays a fixed list of faces, starting over when it runs out.
pub(crate) struct Scripted {
    faces: Vec<u32>,
    next: usize
}

impl Scripted {
    pub fn new(faces: &[u32]) -> Self {
        Self { faces: faces.to_vec(), next: 0 }
    }
}

impl FaceSource for Scripted {
    fn face(&mut self, _sides: u32) -> u32 {
        let face = self.faces[self.next % self.faces.len()];
        self.next += 1;
        face
    }
}


/// Always shows the maximum face and counts how often it was asked.
#[derive(Default)]
pub(crate) struct AlwaysMax {
    pub draws: usize
}

impl FaceSource for AlwaysMax {
    fn face(&mut self, sides: u32) -> u32 {
        self.draws += 1;
        sides
    }
}


pub(crate) fn mode_strategy(max_n: u32) -> impl Strategy<Value = Mode> {
    (0..=max_n, 0u8..4).prop_map(|(n, mode_type)| {
        match mode_type {
            0 => Mode::kh(n),
            1 => Mode::kl(n),
            2 => Mode::dh(n),
            _ => Mode::dl(n),
        }
    })
}

pub(crate) fn plain_term_strategy() -> impl Strategy<Value = DiceTerm> {
    (1..=20u32, 1..=100u32)
        .prop_flat_map(|(count, sides)| {
            prop::collection::vec(mode_strategy(count + 2), 0..3).prop_map(move |modes| {
                modes.into_iter()
                    .fold(DiceTerm::builder(sides).count(count), |builder, mode| builder.mode(mode))
                    .build()
            })
        })
}

pub(crate) fn dice_term_strategy() -> impl Strategy<Value = DiceTerm> {
    (plain_term_strategy(), any::<bool>(), any::<bool>())
        .prop_map(|(term, explode, compound)| {
            DiceTerm::builder(term.sides())
                .count(term.count())
                .dl(term.drop_low())
                .dh(term.drop_high())
                .explode(explode)
                .compound(explode && compound)
                .build()
        })
}
