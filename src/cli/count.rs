//! Count the records in a given file
use crate::parser::pgdf::{self, RecordSpan, RecordType};
use std::collections::BTreeMap;
use std::io::Write;

fn count_records<I>(spans: I) -> crate::Result<BTreeMap<&'static str, i64>>
where
    I: Iterator<Item = crate::Result<RecordSpan>>,
{
    let mut counts = BTreeMap::new();
    for span in spans {
        let name = match span?.record_type {
            RecordType::Data(_) => "Data",
            other => other.name(),
        };
        *counts.entry(name).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Print the number of records of each type
pub fn count(
    path: std::path::PathBuf,
    output: Option<std::path::PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let buf = std::fs::read(path)?;
    let counts = count_records(pgdf::records(&buf))?;

    let mut writer = super::output_writer(output)?;
    for (key, value) in &counts {
        writeln!(writer, "{}\t{}", value, key)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn data_records_share_one_count() {
        let span = |offset, code| {
            Ok(RecordSpan {
                offset,
                length: 8,
                record_type: RecordType::from(code),
            })
        };
        let counts = count_records(
            vec![span(0, -1), span(8, 3), span(16, 7), span(24, -6)].into_iter(),
        )
        .unwrap();
        assert_eq!(counts["Data"], 2);
        assert_eq!(counts["FileHeader"], 1);
        assert_eq!(counts["Background"], 1);
    }
}
