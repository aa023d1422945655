use serde_derive::{Deserialize, Serialize};

/// Visualization palette the chart layer assigns to series by index.
const SERIES_COLORS: [&str; 10] = [
    "#54B399", "#6092C0", "#D36086", "#9170B8", "#CA8EAE",
    "#D6BF57", "#B9A888", "#DA8B45", "#AA6556", "#E7664C",
];

pub fn series_color(index: usize) -> &'static str {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

pub fn is_finite_number(value: Option<f64>) -> bool {
    value.is_some_and(f64::is_finite)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Linemark,
    Bar,
    Area,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum YUnit {
    Time,
    Percent,
    Bytes,
    Integer,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct SeriesPoint {
    pub x: i64,
    pub y: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub title: String,
    pub key: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub color: String,
    pub overall_value: f64,
    pub data: Vec<SeriesPoint>,
}

impl Series {
    /// Multiplies every finite value by the factor. Absent and non-finite values are left as is.
    pub fn scaled(self, factor: f64) -> Series {
        let data = self.data.into_iter().map(|point| SeriesPoint {
            x: point.x,
            y: match point.y {
                Some(value) if is_finite_number(point.y) => Some(value * factor),
                value => value,
            },
        }).collect();

        Series {
            overall_value: self.overall_value * factor,
            data,
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeriesMeta {
    pub key: String,
    pub title: String,
}

/// Static chart metadata, built fresh for every request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartDescriptor {
    pub title: String,
    pub key: String,
    pub chart_type: ChartType,
    pub y_unit: YUnit,
    pub description: String,
    pub series: Vec<SeriesMeta>,
}

impl ChartDescriptor {
    /// An empty chart carrying this descriptor's envelope.
    pub fn to_chart(&self) -> ChartResult {
        ChartResult {
            title: self.title.clone(),
            key: self.key.clone(),
            chart_type: self.chart_type,
            y_unit: self.y_unit,
            description: self.description.clone(),
            series: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResult {
    pub title: String,
    pub key: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub y_unit: YUnit,
    pub description: String,
    pub series: Vec<Series>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn series(overall_value: f64, values: &[Option<f64>]) -> Series {
        Series {
            title: "Billed Duration".to_owned(),
            key: "billed_duration_avg".to_owned(),
            chart_type: ChartType::Linemark,
            color: series_color(0).to_owned(),
            overall_value,
            data: values.iter().enumerate().map(|(index, &y)| SeriesPoint {x: index as i64 * 1000, y}).collect(),
        }
    }

    #[test]
    fn finite_number() {
        assert!(is_finite_number(Some(0.0)));
        assert!(is_finite_number(Some(-1.5)));
        assert!(!is_finite_number(None));
        assert!(!is_finite_number(Some(f64::NAN)));
        assert!(!is_finite_number(Some(f64::INFINITY)));
    }

    #[test]
    fn scaling() {
        let scaled = series(2.5, &[Some(2.0), None, Some(0.0), Some(f64::INFINITY)]).scaled(1000.0);

        assert_eq!(scaled.overall_value, 2500.0);
        assert_eq!(scaled.data.iter().map(|point| point.x).collect::<Vec<_>>(), vec![0, 1000, 2000, 3000]);
        assert_eq!(scaled.data[0].y, Some(2000.0));
        assert_eq!(scaled.data[1].y, None);
        assert_eq!(scaled.data[2].y, Some(0.0));
        assert_eq!(scaled.data[3].y, Some(f64::INFINITY));
        assert_eq!(scaled.title, "Billed Duration");
    }

    #[test]
    fn scaling_keeps_nan() {
        let scaled = series(0.0, &[Some(f64::NAN)]).scaled(1000.0);
        assert!(scaled.data[0].y.unwrap().is_nan());
    }

    #[test]
    fn serialization() {
        let mut chart = ChartDescriptor {
            title: "Lambda Duration".to_owned(),
            key: "avg_duration".to_owned(),
            chart_type: ChartType::Linemark,
            y_unit: YUnit::Time,
            description: "Duration".to_owned(),
            series: Vec::new(),
        }.to_chart();
        chart.series.push(series(2.0, &[Some(2.0), None]));

        assert_eq!(serde_json::to_value(&chart).unwrap(), json!({
            "title": "Lambda Duration",
            "key": "avg_duration",
            "type": "linemark",
            "yUnit": "time",
            "description": "Duration",
            "series": [{
                "title": "Billed Duration",
                "key": "billed_duration_avg",
                "type": "linemark",
                "color": "#54B399",
                "overallValue": 2.0,
                "data": [{"x": 0, "y": 2.0}, {"x": 1000, "y": null}],
            }],
        }));
    }
}
