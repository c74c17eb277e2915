//! Receipt
//!
//! Terminal rendering of a [`PriceBreakdown`]: one table row per applied
//! coupon, followed by a summary block and any skipped coupons.

use std::{fmt::Write, io};

use rustc_hash::FxHashMap;
use rusty_money::{MoneyError, iso::Currency};
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    coupons::{Coupon, CouponId},
    pricing::{DiscountStep, PriceBreakdown, percent_points},
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable checkout quote.
#[derive(Debug, Clone)]
pub struct Receipt<'b, 'a> {
    title: String,
    breakdown: &'b PriceBreakdown<'a>,
    coupon_names: FxHashMap<CouponId, String>,
}

impl<'b, 'a> Receipt<'b, 'a> {
    /// Create a receipt for `breakdown`, headed by `title` (usually the product name).
    pub fn new(title: impl Into<String>, breakdown: &'b PriceBreakdown<'a>) -> Self {
        Self {
            title: title.into(),
            breakdown,
            coupon_names: FxHashMap::default(),
        }
    }

    /// Label coupon rows with the coupons' display names instead of their ids.
    #[must_use]
    pub fn with_coupon_names<'c, 'm: 'c>(
        mut self,
        coupons: impl IntoIterator<Item = &'c Coupon<'m>>,
    ) -> Self {
        self.coupon_names.extend(
            coupons
                .into_iter()
                .map(|coupon| (coupon.id().clone(), coupon.name().to_string())),
        );

        self
    }

    /// Receipt heading
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Breakdown being rendered
    pub fn breakdown(&self) -> &PriceBreakdown<'a> {
        self.breakdown
    }

    /// Currency of every amount on the receipt
    pub fn currency(&self) -> &'a Currency {
        self.breakdown.currency()
    }

    /// Prints the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        writeln!(out, "\n \x1b[1m{}\x1b[0m", self.title).map_err(|_err| ReceiptError::IO)?;

        if self.breakdown.steps.is_empty() {
            writeln!(out, " \x1b[90mNo coupons applied\x1b[0m").map_err(|_err| ReceiptError::IO)?;
        } else {
            let mut builder = Builder::default();
            let mut color_ops: SmallVec<[(usize, usize, Color); 8]> = smallvec![];

            push_receipt_header(&mut builder);

            for (idx, step) in self.breakdown.steps.iter().enumerate() {
                self.append_step_row(&mut builder, &mut color_ops, idx, step);
            }

            write_receipt_table(&mut out, builder, color_ops)?;
        }

        write_receipt_summary(&mut out, self.breakdown)?;

        write_rejections(&mut out, self.breakdown)
    }

    fn coupon_label(&self, id: &CouponId) -> String {
        self.coupon_names
            .get(id)
            .map_or_else(|| id.to_string(), |name| format!("{name} ({id})"))
    }

    fn append_step_row(
        &self,
        builder: &mut Builder,
        color_ops: &mut SmallVec<[(usize, usize, Color); 8]>,
        idx: usize,
        step: &DiscountStep<'_>,
    ) {
        let row = idx + 1;

        let remaining = step
            .remaining()
            .map_or_else(|| "-".to_string(), |remaining| format!("{remaining}"));

        builder.push_record([
            format!("#{row}"),
            self.coupon_label(step.coupon()),
            step_description(step),
            format!("-{}", step.amount()),
            remaining,
        ]);

        color_ops.push((row, 0, color_dark_grey()));
        color_ops.push((row, 3, Color::FG_GREEN));

        if step.remaining().is_none() {
            color_ops.push((row, 4, color_dark_grey()));
        }
    }
}

fn push_receipt_header(builder: &mut Builder) {
    builder.push_record(["", "Coupon", "Description", "Amount", "Remaining"]);
}

fn step_description(step: &DiscountStep<'_>) -> String {
    match step {
        DiscountStep::ShippingWaived { .. } => "Free shipping".to_string(),
        DiscountStep::Percentage { percent, .. } => format!("{}% off", percent_points(*percent)),
        DiscountStep::Flat {
            requested, amount, ..
        } if requested == amount => format!("{requested} off"),
        DiscountStep::Flat { requested, .. } => format!("{requested} off, capped"),
    }
}

fn write_receipt_table(
    out: &mut impl io::Write,
    builder: Builder,
    color_ops: SmallVec<[(usize, usize, Color); 8]>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..5), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    breakdown: &PriceBreakdown<'_>,
) -> Result<(), ReceiptError> {
    let subtotal_label = " Subtotal:";
    let shipping_label = " Shipping:";
    let discount_label = " Discount:";
    let total_label = " \x1b[1mTotal:\x1b[0m";

    let subtotal_val = format!("{}  ", breakdown.base_price);
    let shipping_val = if breakdown.shipping_waived {
        format!("(waived {}) {}  ", breakdown.shipping_fee, breakdown.final_shipping_fee)
    } else {
        format!("{}  ", breakdown.final_shipping_fee)
    };
    let discount_val = format!("-{}  ", breakdown.total_discount);
    let total_val = format!("{}  ", breakdown.final_price);

    let label_width = [subtotal_label, shipping_label, discount_label, total_label]
        .into_iter()
        .map(visible_width)
        .max()
        .unwrap_or_default();

    let value_width = [&subtotal_val, &shipping_val, &discount_val, &total_val]
        .into_iter()
        .map(|value| visible_width(value))
        .max()
        .unwrap_or_default();

    write_summary_line(out, subtotal_label, &subtotal_val, label_width, value_width)?;
    write_summary_line(out, shipping_label, &shipping_val, label_width, value_width)?;
    write_summary_line(out, discount_label, &discount_val, label_width, value_width)?;

    write_summary_line(
        out,
        total_label,
        &format!("\x1b[1m{total_val}\x1b[0m"),
        label_width,
        value_width,
    )?;

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

fn write_rejections(
    out: &mut impl io::Write,
    breakdown: &PriceBreakdown<'_>,
) -> Result<(), ReceiptError> {
    if breakdown.rejected.is_empty() {
        return Ok(());
    }

    writeln!(out, " \x1b[33mSkipped coupons:\x1b[0m").map_err(|_err| ReceiptError::IO)?;

    for rejection in &breakdown.rejected {
        writeln!(out, "   {rejection}").map_err(|_err| ReceiptError::IO)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of UTF-8 box-drawing characters (U+2500..U+257F) in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
