//! Text sanitization applied to every caller-supplied string before it is
//! interpolated into a prompt or handed to a provider.

/// Default cap for interpolated free-text fields.
pub const FIELD_LIMIT: usize = 400;
/// Cap for question text in the evaluation prompt.
pub const QUESTION_TEXT_LIMIT: usize = 1000;
/// Cap for question text in the introduction system prompt.
pub const INTRO_QUESTION_LIMIT: usize = 800;
/// Cap for each conversational history message.
pub const MESSAGE_LIMIT: usize = 1000;

/// Normalize `text` for prompt interpolation.
///
/// Control characters are dropped, whitespace runs collapse to one space,
/// the result is trimmed, `\` and `"` are backslash-escaped, and the output
/// is cut to at most `max_chars` characters. An escape pair is never split,
/// so the result never ends in a dangling backslash.
pub fn sanitize(text: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(text.len().min(max_chars * 2));
    let mut count = 0usize;

    for word in text.split_whitespace() {
        let pending_space = usize::from(count > 0);
        let mut word_started = false;

        for c in word.chars().filter(|c| !c.is_control()) {
            let escaped = matches!(c, '"' | '\\');
            let needed = usize::from(escaped) + 1 + if word_started { 0 } else { pending_space };
            if count + needed > max_chars {
                return out;
            }
            if !word_started && pending_space == 1 {
                out.push(' ');
            }
            if escaped {
                out.push('\\');
            }
            out.push(c);
            count += needed;
            word_started = true;
        }
    }

    out
}

/// Whether `s` contains a `"` not preceded by an escaping backslash.
#[cfg(test)]
pub(crate) fn has_unescaped_quote(s: &str) -> bool {
    let mut backslashes = 0usize;
    for c in s.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' if backslashes % 2 == 0 => return true,
            _ => backslashes = 0,
        }
    }
    false
}
