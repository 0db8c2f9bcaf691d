//! CSV row writer
//!
//! Fields are quoted only when they contain the separator, a quote or a line
//! break; embedded quotes are doubled.

use std::io::{self, Write};

use crate::models::{EventField, EventRecord};

const SEPARATOR: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one row terminated by CRLF
pub fn write_row<W, S>(w: &mut W, row: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{SEPARATOR}")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    write!(w, "\r\n")
}

/// Header row followed by one row per record, in field order
pub fn write_records<W: Write>(w: &mut W, records: &[EventRecord]) -> io::Result<()> {
    write_row(w, &EventField::header())?;
    for record in records {
        write_row(w, &record.to_row())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(row: &[&str]) -> String {
        let mut out = Vec::new();
        write_row(&mut out, row).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_fields() {
        assert_eq!(render(&["a", "b c", "N/A"]), "a,b c,N/A\r\n");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(
            render(&["x.com/a, github.com/b", "say \"hi\"", "two\nlines"]),
            "\"x.com/a, github.com/b\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n"
        );
    }

    #[test]
    fn test_header_order() {
        let mut out = Vec::new();
        write_records(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "event_name,date_time,location,event_details,organizer_name,\
             organizer_contact,host_email,host_social_media,event_url\r\n"
        );
    }
}
