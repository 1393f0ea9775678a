//! Stacked bar charts of non-Irish nationality shares, one per scheme.
//!
//! Rendering works off the persisted wide CSV, never the in-memory table.
//! The "Irish nationals" column is dropped before plotting; the dashed
//! reference line stands in for the non-Irish population share instead.

use std::collections::HashSet;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::chart::SeriesLabelPosition;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::FontTransform;
use polars::prelude::*;
use tracing::info;

use crate::error::ShareError;
use crate::schema::{cols, files, nationality};

/// Okabe-Ito colors, one per non-Irish nationality group.
pub const PALETTE: [RGBColor; 4] = [
    RGBColor(230, 159, 0),  // #E69F00
    RGBColor(86, 180, 233), // #56B4E9
    RGBColor(0, 158, 115),  // #009E73
    RGBColor(204, 121, 167), // #CC79A7
];

const REFERENCE_COLOR: RGBColor = RGBColor(128, 0, 128);

/// Configuration for the per-scheme share charts.
pub struct ChartConfig {
    /// Dashed baseline drawn on every chart, as a percentage. The default of
    /// 12 is the CSO's 2022 non-Irish share of the population.
    pub reference_pct: f64,
    /// Directory the PNG files land in; created if absent.
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            reference_pct: 12.0,
            out_dir: PathBuf::from(files::CHART_DIR),
            width: 1200,
            height: 600,
        }
    }
}

/// One scheme's slice of the wide table, ready to plot.
struct SchemeSeries {
    scheme: String,
    periods: Vec<String>,
    nationalities: Vec<String>,
    /// values[nationality][period]
    values: Vec<Vec<f64>>,
}

/// Render one stacked bar chart per scheme, in order of first appearance in
/// the wide table. Returns the paths of the written PNG files.
pub fn render_scheme_charts(
    shares: &DataFrame,
    config: &ChartConfig,
) -> Result<Vec<PathBuf>, ShareError> {
    let non_irish = shares.drop(nationality::IRISH)?;

    let nationalities: Vec<String> = non_irish
        .get_column_names_str()
        .iter()
        .filter(|c| **c != cols::PERIOD && **c != cols::SCHEME_DESCRIPTION)
        .map(|c| c.to_string())
        .collect();

    fs::create_dir_all(&config.out_dir)?;

    let mut written = Vec::new();
    for scheme in unique_schemes(&non_irish)? {
        if nationalities.len() > PALETTE.len() {
            return Err(ShareError::PaletteExhausted {
                scheme,
                needed: nationalities.len(),
                available: PALETTE.len(),
            });
        }

        let series = scheme_series(&non_irish, &scheme, &nationalities)?;
        let path = config.out_dir.join(format!("{}.png", scheme_slug(&scheme)));
        draw_stacked_chart(&series, config, &path)
            .map_err(|e| ShareError::Render(e.to_string()))?;
        info!(scheme = %scheme, path = %path.display(), "rendered chart");
        written.push(path);
    }

    Ok(written)
}

/// Distinct scheme names in order of first appearance.
fn unique_schemes(df: &DataFrame) -> Result<Vec<String>, ShareError> {
    let schemes = df.column(cols::SCHEME_DESCRIPTION)?.str()?;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in schemes.into_iter().flatten() {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    Ok(out)
}

/// Select one scheme's rows and pull out its periods and per-nationality
/// share columns.
fn scheme_series(
    df: &DataFrame,
    scheme: &str,
    nationalities: &[String],
) -> Result<SchemeSeries, ShareError> {
    let rows = df
        .clone()
        .lazy()
        .filter(col(cols::SCHEME_DESCRIPTION).eq(lit(scheme)))
        .collect()?;

    let periods: Vec<String> = rows
        .column(cols::PERIOD)?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect();

    let mut values = Vec::with_capacity(nationalities.len());
    for name in nationalities {
        let shares = rows.column(name)?.cast(&DataType::Float64)?;
        let shares = shares.f64()?;
        values.push(shares.into_iter().map(|v| v.unwrap_or(0.0)).collect());
    }

    Ok(SchemeSeries {
        scheme: scheme.to_string(),
        periods,
        nationalities: nationalities.to_vec(),
        values,
    })
}

fn draw_stacked_chart(
    series: &SchemeSeries,
    config: &ChartConfig,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let n = series.periods.len();
    let stack_max = (0..n)
        .map(|i| series.values.iter().map(|v| v[i]).filter(|v| v.is_finite()).sum::<f64>())
        .fold(0.0f64, f64::max);
    let y_max = stack_max.max(config.reference_pct).max(1.0) * 1.1;
    let x_max = n.max(1) as f64 - 0.5;

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Recipients of {} by Broad Nationality Group (Excl. Irish Citizens)",
                series.scheme
            ),
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(110)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..x_max, 0.0f64..y_max)?;

    let periods = series.periods.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&move |x| {
            let i = x.round();
            if (x - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            periods.get(i as usize).cloned().unwrap_or_default()
        })
        .x_label_style(("sans-serif", 13).into_font().transform(FontTransform::Rotate90))
        .x_desc("Period (Year and Quarter)")
        .y_desc("Percentage (%)")
        .draw()?;

    // Segments stack in column order, bottom first.
    let mut bottoms = vec![0.0f64; n];
    for (j, name) in series.nationalities.iter().enumerate() {
        let color = PALETTE[j];
        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            let v = series.values[j][i];
            let y0 = bottoms[i];
            bottoms[i] += v;
            bars.push(Rectangle::new(
                [(i as f64 - 0.35, y0), (i as f64 + 0.35, y0 + v)],
                color.filled(),
            ));
        }
        chart
            .draw_series(bars)?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .draw_series(DashedLineSeries::new(
            vec![(-0.5, config.reference_pct), (x_max, config.reference_pct)],
            6,
            4,
            REFERENCE_COLOR.stroke_width(2),
        ))?
        .label("Non-Irish Citizen Population % (2022)")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 10, y)], REFERENCE_COLOR.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// File-name token derived from a scheme name.
fn scheme_slug(scheme: &str) -> String {
    let mut slug = String::with_capacity(scheme.len());
    for c in scheme.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}
