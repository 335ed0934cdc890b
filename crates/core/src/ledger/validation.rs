//! Business rule validation for single journal lines.

use rust_decimal::Decimal;

use super::error::{LedgerError, LineDefect};
use super::types::{JournalLine, JournalLineInput, Side};

/// Largest amount a single line may carry: 999,999,999,999,999.9999.
///
/// Matches the `NUMERIC(19, 4)` amount columns.
pub const MAX_LINE_AMOUNT: Decimal = Decimal::from_parts(0x89E7_FFFF, 0x8AC7_2304, 0, false, 4);

/// Decimal places a line amount may carry.
pub const MAX_LINE_SCALE: u32 = 4;

/// Validates the shape of one input line and resolves its side and amount.
///
/// Exactly one of debit and credit must be positive, the other zero, and
/// neither may be negative. The amount must fit [`MAX_LINE_AMOUNT`] and
/// [`MAX_LINE_SCALE`].
///
/// # Errors
///
/// Returns `InvalidLine` describing the defect.
pub fn validate_line_shape(
    line_no: u32,
    input: &JournalLineInput,
) -> Result<(Side, Decimal), LedgerError> {
    let defect =
        |defect: LineDefect| LedgerError::InvalidLine { line_no, defect };

    if input.debit < Decimal::ZERO || input.credit < Decimal::ZERO {
        return Err(defect(LineDefect::Negative));
    }
    let (side, amount) = match (input.debit > Decimal::ZERO, input.credit > Decimal::ZERO) {
        (true, false) => (Side::Debit, input.debit),
        (false, true) => (Side::Credit, input.credit),
        (true, true) => return Err(defect(LineDefect::BothSides)),
        (false, false) => return Err(defect(LineDefect::NoAmount)),
    };
    if amount > MAX_LINE_AMOUNT {
        return Err(defect(LineDefect::TooLarge));
    }
    if amount.normalize().scale() > MAX_LINE_SCALE {
        return Err(defect(LineDefect::TooPrecise));
    }
    Ok((side, amount))
}

/// Converts input lines into numbered journal lines, checking shape only.
///
/// # Errors
///
/// Returns `InsufficientLines` for fewer than two lines, otherwise the first
/// `InvalidLine` found.
pub fn shape_lines(inputs: &[JournalLineInput]) -> Result<Vec<JournalLine>, LedgerError> {
    if inputs.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    inputs
        .iter()
        .zip(1u32..)
        .map(|(input, line_no)| {
            let (side, amount) = validate_line_shape(line_no, input)?;
            Ok(JournalLine {
                line_no,
                account_id: input.account_id,
                side,
                amount,
                description: input.description.clone(),
            })
        })
        .collect()
}
