use crate::error::{LottoError, Result};
use crate::types::GameKind;

/// Payouts in whole dollars, indexed by regular-number matches (0..=5).
#[derive(Debug)]
pub struct PrizeTable {
    pub without_bonus: [u64; 6],
    pub with_bonus: [u64; 6],
}

impl PrizeTable {
    pub fn payout(&self, matches: usize, bonus_match: bool) -> Result<u64> {
        let row = if bonus_match {
            &self.with_bonus
        } else {
            &self.without_bonus
        };
        row.get(matches).copied().ok_or(LottoError::PrizeTable {
            matches,
            bonus: bonus_match,
        })
    }
}

#[derive(Debug)]
pub struct GameProfile {
    pub kind: GameKind,
    pub name: &'static str,
    pub bonus_label: &'static str,
    pub dataset_url: &'static str,
    pub prizes: PrizeTable,
}

// The jackpot is variable; 1_000_000 stands in for it in both tables.
static MEGA_MILLIONS: GameProfile = GameProfile {
    kind: GameKind::MegaMillions,
    name: "Mega Millions",
    bonus_label: "Mega Ball",
    dataset_url: "https://data.ny.gov/resource/5xaw-6ayf.json",
    prizes: PrizeTable {
        without_bonus: [0, 0, 0, 10, 500, 1_000_000],
        with_bonus: [2, 4, 10, 200, 10_000, 1_000_000],
    },
};

static POWERBALL: GameProfile = GameProfile {
    kind: GameKind::Powerball,
    name: "Powerball",
    bonus_label: "Powerball",
    dataset_url: "https://data.ny.gov/resource/d6yy-54nr.json",
    prizes: PrizeTable {
        without_bonus: [0, 0, 0, 7, 100, 1_000_000],
        with_bonus: [4, 4, 7, 100, 50_000, 1_000_000],
    },
};

impl GameKind {
    pub fn profile(self) -> &'static GameProfile {
        match self {
            GameKind::MegaMillions => &MEGA_MILLIONS,
            GameKind::Powerball => &POWERBALL,
        }
    }
}

pub fn payout(game: GameKind, matches: usize, bonus_match: bool) -> Result<u64> {
    game.profile().prizes.payout(matches, bonus_match)
}
