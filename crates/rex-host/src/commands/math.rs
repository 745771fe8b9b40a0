use async_trait::async_trait;
use rex_protocol::number_value;

use super::{Builtin, builtin};
use crate::context::CommandContext;
use crate::handler::{CommandHandler, CommandResult};

builtin!(Add, "add");

#[async_trait]
impl CommandHandler for Add {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, _ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        let total: f64 = args.iter().map(|arg| parse_number(arg)).sum();
        // A sum that overflowed to infinity cannot be encoded.
        Ok(Some(number_value(total)?))
    }
}

/// Value of the longest numeric prefix of `token` (`2px` is 2). Tokens with
/// no numeric prefix, or whose prefix is not finite, count as zero.
fn parse_number(token: &str) -> f64 {
    let token = token.trim_start();
    token[..numeric_prefix_len(token)]
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Length of the leading `[+-]digits[.digits][e[+-]digits]` run.
fn numeric_prefix_len(token: &str) -> usize {
    let bytes = token.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut frac_digits = 0;
    let mut mantissa_end = int_end;
    if bytes.get(int_end) == Some(&b'.') {
        mantissa_end = digits_from(int_end + 1);
        frac_digits = mantissa_end - int_end - 1;
    }
    // A sign or a lone dot is not a number.
    if int_end == end && frac_digits == 0 {
        return 0;
    }
    end = mantissa_end;

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    end
}
