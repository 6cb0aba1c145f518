// Plot builders, one per aggregate. Each returns None when there is nothing to draw.
use crate::analyzer::{Aggregates, AgeBucket, TREND_START_YEAR, ranked, top_n};
use crate::model::CompanyStatus;

use plotly::common::{Marker, Mode, Orientation, Title};
use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Bar, Plot, Scatter};
use std::collections::BTreeSet;

const TOP_N: usize = 10;

fn layout(title: &str, x_title: &str, y_title: &str) -> Layout {
    Layout::new()
        .title(Title::new(title))
        .x_axis(Axis::new().title(Title::new(x_title)))
        .y_axis(Axis::new().title(Title::new(y_title)))
}

fn bar_plot(labels: Vec<String>, counts: Vec<usize>, layout: Layout) -> Plot {
    let mut plot = Plot::new();
    plot.add_trace(Bar::new(labels, counts));
    plot.set_layout(layout);
    plot
}

pub fn companies_by_year(aggs: &Aggregates, location: &str) -> Option<Plot> {
    let years: Vec<(i32, usize)> = aggs
        .by_year
        .range(TREND_START_YEAR..)
        .map(|(y, c)| (*y, *c))
        .collect();
    if years.is_empty() {
        return None;
    }
    let xs: Vec<i32> = years.iter().map(|(y, _)| *y).collect();
    let ys: Vec<usize> = years.iter().map(|(_, c)| *c).collect();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(xs.clone(), ys).name("Companies"));
    if let Some(trend) = aggs.year_trend {
        let line: Vec<f64> = xs.iter().map(|y| trend.at(f64::from(*y))).collect();
        plot.add_trace(Scatter::new(xs, line).mode(Mode::Lines).name("Trend"));
    }
    plot.set_layout(layout(
        &format!("Company Formations by Year - {}", location),
        "Year",
        "Number of Companies",
    ));
    Some(plot)
}

pub fn postal_distribution(aggs: &Aggregates, location: &str) -> Option<Plot> {
    let top = top_n(&aggs.by_postal_prefix, TOP_N);
    if top.is_empty() {
        return None;
    }
    let (labels, counts) = top.into_iter().unzip();
    Some(bar_plot(
        labels,
        counts,
        layout(
            &format!("Top {} Postal Code Areas - {}", TOP_N, location),
            "Postal Code Area",
            "Number of Companies",
        ),
    ))
}

pub fn company_types(aggs: &Aggregates, location: &str) -> Option<Plot> {
    let entries = ranked(&aggs.by_type);
    if entries.is_empty() {
        return None;
    }
    let (labels, counts) = entries.into_iter().map(|(t, c)| (t.label(), c)).unzip();
    Some(bar_plot(
        labels,
        counts,
        layout(
            &format!("Distribution of Company Types - {}", location),
            "Company Type",
            "Number of Companies",
        ),
    ))
}

pub fn sic_codes(aggs: &Aggregates, location: &str) -> Option<Plot> {
    let top = top_n(&aggs.by_sic, TOP_N);
    if top.is_empty() {
        return None;
    }
    let (labels, counts) = top.into_iter().unzip();
    Some(bar_plot(
        labels,
        counts,
        layout(
            &format!("Top {} Most Common SIC Codes - {}", TOP_N, location),
            "SIC Code",
            "Frequency",
        ),
    ))
}

pub fn status_breakdown(aggs: &Aggregates, location: &str) -> Option<Plot> {
    let entries = ranked(&aggs.by_status);
    if entries.is_empty() {
        return None;
    }
    let (labels, counts) = entries.into_iter().map(|(s, c)| (s.label(), c)).unzip();
    Some(bar_plot(
        labels,
        counts,
        layout(
            &format!("Company Status - {}", location),
            "Status",
            "Number of Companies",
        ),
    ))
}

pub fn status_by_year(aggs: &Aggregates, location: &str) -> Option<Plot> {
    if aggs.status_by_year.is_empty() {
        return None;
    }
    let years: Vec<i32> = aggs.status_by_year.keys().copied().collect();
    let statuses: BTreeSet<&CompanyStatus> = aggs
        .status_by_year
        .values()
        .flat_map(|per_status| per_status.keys())
        .collect();

    let mut plot = Plot::new();
    for status in statuses {
        let counts: Vec<usize> = aggs
            .status_by_year
            .values()
            .map(|per_status| per_status.get(status).copied().unwrap_or(0))
            .collect();
        plot.add_trace(Bar::new(years.clone(), counts).name(&status.label()));
    }
    plot.set_layout(
        layout(
            &format!("Company Status by Incorporation Year - {}", location),
            "Year",
            "Number of Companies",
        )
        .bar_mode(BarMode::Stack),
    );
    Some(plot)
}

pub fn healthcare_services(aggs: &Aggregates, location: &str) -> Option<Plot> {
    let mut entries = ranked(&aggs.healthcare_services);
    if entries.is_empty() {
        return None;
    }
    // smallest first so the largest bar ends up on top
    entries.reverse();
    let (labels, counts): (Vec<String>, Vec<usize>) = entries.into_iter().unzip();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(counts, labels).orientation(Orientation::Horizontal));
    plot.set_layout(layout(
        &format!("Healthcare Service Types - {}", location),
        "Number of Services",
        "",
    ));
    Some(plot)
}

pub fn age_distribution(aggs: &Aggregates, location: &str) -> Option<Plot> {
    if aggs.by_age_bucket.values().all(|c| *c == 0) {
        return None;
    }
    let labels: Vec<String> = AgeBucket::ALL.iter().map(|b| b.label().to_string()).collect();
    let counts: Vec<usize> = AgeBucket::ALL
        .iter()
        .map(|b| aggs.by_age_bucket.get(b).copied().unwrap_or(0))
        .collect();
    Some(bar_plot(
        labels,
        counts,
        layout(
            &format!("Company Age Distribution - {}", location),
            "Company Age (Years)",
            "Number of Companies",
        ),
    ))
}

/// Bubble chart of companies per town, bubble area following the count.
pub fn geographic_distribution(aggs: &Aggregates, location: &str) -> Option<Plot> {
    let entries = ranked(&aggs.by_city);
    let max = entries.first().map(|(_, c)| *c)?;
    let total: usize = entries.iter().map(|(_, c)| c).sum();

    let cities: Vec<String> = entries.iter().map(|(city, _)| city.clone()).collect();
    let counts: Vec<usize> = entries.iter().map(|(_, c)| *c).collect();
    let sizes: Vec<usize> = counts.iter().map(|c| 10 + 50 * c / max).collect();
    let hover: Vec<String> = entries
        .iter()
        .map(|(city, c)| format!("{}: {} companies ({:.1}%)", city, c, *c as f64 * 100.0 / total as f64))
        .collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(cities, counts)
            .mode(Mode::Markers)
            .marker(Marker::new().size_array(sizes))
            .text_array(hover),
    );
    plot.set_layout(layout(
        &format!("Geographic Distribution - {}", location),
        "Town / City",
        "Number of Companies",
    ));
    Some(plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisDataset, CompanyRecord};
    use crate::normalizer::clean_all;
    use chrono::NaiveDate;

    fn aggs(rows: Vec<CompanyRecord>) -> Aggregates {
        Aggregates::compute(&clean_all(rows), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn row(number: &str, year: i32, city: &str) -> CompanyRecord {
        CompanyRecord {
            company_name: Some(format!("C{number}")),
            company_number: Some(number.into()),
            status: Some(if year % 2 == 0 { "active" } else { "dissolved" }.into()),
            company_type: Some("ltd".into()),
            incorporation_date: Some(format!("{year}-03-01")),
            sic_codes: vec!["87300".into()],
            city: Some(city.into()),
            postal_code: Some("B1 1AA".into()),
            ..CompanyRecord::default()
        }
    }

    #[test]
    fn every_chart_renders_for_populated_data() {
        let a = aggs(vec![
            row("1", 2010, "Birmingham"),
            row("2", 2015, "Birmingham"),
            row("3", 2021, "Solihull"),
        ]);
        let builders: [fn(&Aggregates, &str) -> Option<Plot>; 9] = [
            companies_by_year,
            postal_distribution,
            company_types,
            sic_codes,
            status_breakdown,
            status_by_year,
            healthcare_services,
            age_distribution,
            geographic_distribution,
        ];
        for build in builders {
            let plot = build(&a, "Birmingham").expect("chart expected");
            assert!(plot.to_html().contains("Birmingham"));
        }
    }

    #[test]
    fn empty_data_draws_nothing() {
        let a = Aggregates::compute(&AnalysisDataset::default(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(companies_by_year(&a, "X").is_none());
        assert!(geographic_distribution(&a, "X").is_none());
        assert!(age_distribution(&a, "X").is_none());
        assert!(healthcare_services(&a, "X").is_none());
    }

    #[test]
    fn formations_chart_starts_in_2000() {
        let a = aggs(vec![row("1", 1995, "Birmingham")]);
        assert!(companies_by_year(&a, "Birmingham").is_none());
    }
}
