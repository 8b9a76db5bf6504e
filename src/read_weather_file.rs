//! Reader for DWD test reference year (TRY) weather files.
//!
//! The 2010 and 2016 DWD formats carry free-text comments before the column
//! header without marking them, so the header has to be located by searching
//! for the `***` separator line that follows it. Columns are aligned with
//! whitespace rather than a delimiter.

use anyhow::{bail, Context};
use std::io::{BufRead, BufReader, Read};

const TEMPERATURE_COLUMN: &str = "t";
const CLOUD_COVER_COLUMN: &str = "N";

/// The hourly weather series a load profile run needs: ambient temperature
/// in degrees Celsius and cloud cover in okta.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeatherData {
    pub temperature: Vec<f64>,
    pub cloud_cover: Vec<f64>,
}

pub fn read_dwd_weather_file(file: impl Read) -> anyhow::Result<WeatherData> {
    let lines = BufReader::new(file)
        .lines()
        .collect::<Result<Vec<String>, _>>()
        .context("DWD weather file")?;

    let separator = lines
        .iter()
        .position(|line| line.contains("***"))
        .context("header row not found in weather file, expected a '***' separator line")?;
    if separator == 0 {
        bail!("weather file starts with the '***' separator, no header row before it");
    }
    let header: Vec<&str> = lines[separator - 1].split_whitespace().collect();
    let temperature_column = column_index(&header, TEMPERATURE_COLUMN)?;
    let cloud_cover_column = column_index(&header, CLOUD_COVER_COLUMN)?;

    let mut weather = WeatherData::default();
    for (number, line) in lines.iter().enumerate().skip(separator + 1) {
        // Trailing comment blocks are marked with '*' like the separator.
        if line.trim().is_empty() || line.trim_start().starts_with('*') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let parse = |column: usize, name: &str| {
            fields
                .get(column)
                .with_context(|| format!("line {}: missing {name} column", number + 1))?
                .parse::<f64>()
                .with_context(|| format!("line {}: invalid {name} value", number + 1))
        };
        weather
            .temperature
            .push(parse(temperature_column, "temperature")?);
        weather
            .cloud_cover
            .push(parse(cloud_cover_column, "cloud cover")?);
    }
    Ok(weather)
}

fn column_index(header: &[&str], name: &str) -> anyhow::Result<usize> {
    header
        .iter()
        .position(|column| *column == name)
        .with_context(|| format!("column '{name}' not found in weather file header"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const DWD_SNIPPET: &str = "\
Testreferenzjahr TRY2010_04
Art des TRY : mittleres Jahr
Format: (2I3,...)

RW      HW    MM DD HH     t    p  WR   WG  N    x  RF    B    D   A    E IL
***
3936500 2449500  1  1  1  -1.8 1000 210  3.0  6  3.2  89    0    0 273    0 3
3936500 2449500  1  1  2  -2.1 1000 220  2.9  7  3.1  90    0    0 272    0 3
3936500 2449500  1  1  3  -2.4  999 220  2.8  8  3.0  91    0    0 271    0 3

*** Ende der Datenzeilen
";

    #[rstest]
    fn reads_temperature_and_cloud_cover() {
        let weather = read_dwd_weather_file(DWD_SNIPPET.as_bytes()).unwrap();
        assert_eq!(weather.temperature, vec![-1.8, -2.1, -2.4]);
        assert_eq!(weather.cloud_cover, vec![6.0, 7.0, 8.0]);
    }

    #[rstest]
    fn missing_separator_is_an_error() {
        let file = "RW HW MM DD HH t N\n1 2 3 4 5 6 7\n";
        let err = read_dwd_weather_file(file.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("header row not found"));
    }

    #[rstest]
    fn missing_columns_are_an_error() {
        let file = "RW HW MM DD HH p N\n***\n1 2 3 4 5 6 7\n";
        let err = read_dwd_weather_file(file.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("column 't' not found"));
    }

    #[rstest]
    fn malformed_values_name_the_line() {
        let file = "t N\n***\n1.0 2\nbroken 3\n";
        let err = read_dwd_weather_file(file.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 4"));
    }
}
