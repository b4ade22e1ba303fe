use chrono::NaiveDate;

use crate::error::{LottoError, Result};
use crate::prizes::payout;
use crate::types::{Drawing, GameKind, Ticket, WinningsResult};

/// Counts regular-number hits and checks the bonus ball.
///
/// Each winning regular number is checked independently against the
/// ticket's regular numbers, so order never matters.
pub fn score(ticket_numbers: &[u32], winning_numbers: &[u32]) -> Result<(usize, bool)> {
    let Some((winning_bonus, winning_regular)) = winning_numbers.split_last() else {
        return Err(LottoError::validation(
            "drawing",
            "[]",
            "malformed drawing: no winning numbers",
        ));
    };
    let Some((ticket_bonus, ticket_regular)) = ticket_numbers.split_last() else {
        return Err(LottoError::validation(
            "ticket",
            "[]",
            "malformed ticket: no numbers",
        ));
    };

    let matches = winning_regular
        .iter()
        .filter(|&number| ticket_regular.contains(number))
        .count();

    Ok((matches, winning_bonus == ticket_bonus))
}

pub fn evaluate(
    game: GameKind,
    draw_date: NaiveDate,
    ticket_numbers: &[u32],
    winning_numbers: &[u32],
) -> Result<WinningsResult> {
    let (matches, bonus_match) = score(ticket_numbers, winning_numbers)?;
    let payout = payout(game, matches, bonus_match)?;
    let message = render_message(
        game,
        draw_date,
        ticket_numbers,
        winning_numbers,
        matches,
        bonus_match,
        payout,
    );

    Ok(WinningsResult {
        draw_date,
        game,
        ticket_numbers: ticket_numbers.to_vec(),
        winning_numbers: winning_numbers.to_vec(),
        matches,
        bonus_match,
        payout,
        message,
    })
}

pub fn evaluate_ticket(ticket: &Ticket, drawing: &Drawing) -> Result<WinningsResult> {
    evaluate(ticket.game(), drawing.date, ticket.numbers(), &drawing.numbers)
}

fn render_message(
    game: GameKind,
    draw_date: NaiveDate,
    ticket_numbers: &[u32],
    winning_numbers: &[u32],
    matches: usize,
    bonus_match: bool,
    payout: u64,
) -> String {
    let profile = game.profile();
    format!(
        concat!(
            "{} : {}\n",
            "  ticket: {:?}\n",
            "  winning numbers: {:?}\n",
            "  matches: {}\n",
            "  bonus ({}): {}\n",
            "  winnings: ${}\n\n",
        ),
        draw_date,
        profile.name,
        ticket_numbers,
        winning_numbers,
        matches,
        profile.bonus_label,
        bonus_match,
        payout
    )
}
