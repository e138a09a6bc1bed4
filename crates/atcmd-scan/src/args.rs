//! Comma separated parameter lists.
//!
//! Responses such as `+CMGL: 1,"REC UNREAD","+1555",,"24/01/01,10:00:00"`
//! are usually captured whole with `%[^\r\n]` and split afterwards. A comma
//! preceded by a backslash is part of the value rather than a separator.

/// Split `args` at unescaped commas into at most `max_args` fields.
///
/// `\,` is unescaped to `,`. Once `max_args` fields exist, the rest of the
/// input (separators included) is left in the final field as received.
/// An empty input gives a single empty field.
pub fn split_args(args: &str, max_args: usize) -> Vec<String> {
    let mut fields = Vec::new();
    if max_args == 0 {
        return fields;
    }

    let mut current = String::new();
    let mut chars = args.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, ','))) => {
                current.push(',');
                chars.next();
            }
            ',' if fields.len() + 1 >= max_args => {
                current.push_str(&args[idx..]);
                break;
            }
            ',' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}
