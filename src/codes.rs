//! Country code tables from simulation run manifests

use crate::errors::Result;
use crate::utils::prepare_output_path;
use log::info;
use std::collections::BTreeMap;
use std::path::Path;

/// Column holding the numeric country id
const COUNTRY_ID_COLUMN: usize = 5;
/// Column holding the country name
const COUNTRY_NAME_COLUMN: usize = 6;

/// Counts from a country-code extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodesSummary {
    pub rows: usize,
    pub excluded: usize,
    pub undefined: usize,
    /// Country name to its first-seen id, sorted by name
    pub codes: BTreeMap<String, u32>,
}

/// Collect country names and ids from a run manifest, skipping `excluded` countries.
pub fn collect_country_codes<R: std::io::Read>(
    reader: R,
    excluded: &[String],
) -> Result<CodesSummary> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut summary = CodesSummary::default();
    for row in csv_reader.records() {
        let row = row?;
        summary.rows += 1;

        let country = row.get(COUNTRY_NAME_COLUMN).unwrap_or("").trim();
        if excluded.iter().any(|c| c == country) {
            summary.excluded += 1;
            continue;
        }

        let id = row.get(COUNTRY_ID_COLUMN).unwrap_or("").trim();
        match id.parse::<u32>() {
            Ok(id) => {
                summary.codes.entry(country.to_string()).or_insert(id);
            }
            Err(_) => summary.undefined += 1,
        }
    }
    Ok(summary)
}

/// Write `country,code` rows for every country in `run_file` to `output`.
/// Names containing commas or quotes are quoted.
pub fn extract_country_codes(
    run_file: &Path,
    output: &Path,
    excluded: &[String],
) -> Result<CodesSummary> {
    let summary = collect_country_codes(std::fs::File::open(run_file)?, excluded)?;

    prepare_output_path(output, true)?;
    let mut writer = csv::Writer::from_path(output)?;
    for (country, id) in &summary.codes {
        writer.write_record([country.as_str(), id.to_string().as_str()])?;
    }
    writer.flush()?;

    info!(
        "File inspection completed, wrote {} country codes to {}\tnumber of excluded records: {}\t\
         country undefined: {}",
        summary.codes.len(),
        output.display(),
        summary.excluded,
        summary.undefined
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN_FILE: &str = "\
globalID,latitude,longitude,landuse,soiltype,country_id,country
1,50.0,10.0,1,2,276,Germany
2,50.1,10.1,1,2,276,Germany
3,35.0,105.0,1,2,156,China
4,47.0,2.0,1,2,250,France
5,47.1,2.1,1,2,n/a,France
6,52.0,5.0,1,2,528,Netherlands
";

    #[test]
    fn first_id_per_country_sorted() {
        let summary = collect_country_codes(RUN_FILE.as_bytes(), &["China".to_string()]).unwrap();
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.undefined, 1);
        let names: Vec<&str> = summary.codes.keys().map(String::as_str).collect();
        assert_eq!(names, ["France", "Germany", "Netherlands"]);
        assert_eq!(summary.codes["Germany"], 276);
    }

    #[test]
    fn names_with_commas_stay_one_field() {
        let dir = tempfile::tempdir().unwrap();
        let run_file = dir.path().join("run.csv");
        let output = dir.path().join("codes.csv");
        std::fs::write(
            &run_file,
            "globalID,latitude,longitude,landuse,soiltype,country_id,country\n\
             1,37.5,127.0,1,2,410,\"Korea, Republic of\"\n",
        )
        .unwrap();

        let summary = extract_country_codes(&run_file, &output, &[]).unwrap();
        assert_eq!(summary.codes["Korea, Republic of"], 410);

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "\"Korea, Republic of\",410\n");
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(&row[0], "Korea, Republic of");
    }
}
