//! Print info about a PAMGuard binary file
use crate::parser::pgdf::{self, DecodeOptions};
use std::collections::BTreeSet;

/// Print info about a PAMGuard binary file
pub fn info<P: AsRef<std::path::Path>>(
    path: P,
    options: DecodeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = pgdf::read_file_with(path.as_ref(), options)?;
    let header = &file.header;

    println!("File: {}", path.as_ref().display());
    println!("Format version: {}", header.file_version);
    println!(
        "Application: {} {} ({})",
        header.application, header.application_version, header.branch
    );
    println!("Module type: {}", header.module_type);
    println!("Module name: {}", header.module_name);
    println!("Stream name: {}", header.stream_name);
    println!("Data date: {}", header.data_date);
    println!("Analysis date: {}", header.analysis_date);

    match &file.module {
        Some(module) => {
            println!("Module version: {}", module.header.module_version);
            println!("Number of objects: {}", module.objects.len());
            println!("Number of background records: {}", module.background.len());
            if module.is_open() {
                println!("Module footer: missing");
            }
        }
        None => println!("Module: none"),
    }

    if let Some((start, end)) = file.time_range() {
        println!("Start date: {}", start);
        println!("End date: {}", end);
    }

    let sonars: BTreeSet<i16> = file
        .objects()
        .iter()
        .filter_map(|o| o.track())
        .flat_map(|t| t.points().iter().map(|p| p.sonar_id))
        .collect();
    if !sonars.is_empty() {
        println!("Sonars:");
        for id in &sonars {
            println!("\t{}", id);
        }
    }

    match &file.footer {
        Some(footer) => {
            println!("Objects in footer: {}", footer.num_objects);
            if let (Some(lo), Some(hi)) = (footer.lowest_uid, footer.highest_uid) {
                println!("UID range: {} to {}", lo, hi);
            }
            println!("End reason: {}", footer.end_reason);
        }
        None => println!("File footer: missing"),
    }

    if !file.skipped.is_empty() {
        println!("Skipped records:");
        for skipped in &file.skipped {
            println!("\t{}", skipped.error);
        }
    }

    Ok(())
}
