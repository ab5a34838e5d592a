//! Prometheus text exposition format.
//!
//! Renders a scrape snapshot into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent. Every family
//! has a fixed label set; absent optional labels render as empty strings.

use std::fmt::Write;

use pricing_core::{MetricFamily, PriceLabels, ShapeLabels};

use crate::metric_set::ScrapeSnapshot;

/// Prefix of every exported metric name.
pub const NAMESPACE: &str = "aws_pricing";

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Render the price families and the scrape self-metrics of `snapshot`.
pub fn render_prometheus(snapshot: &ScrapeSnapshot) -> String {
    let mut out = String::new();
    let metrics = &snapshot.metrics;

    for family in MetricFamily::ALL {
        let name = format!("{NAMESPACE}_{}", family.name());
        header(&mut out, &name, family.help(), "gauge");
        match family {
            MetricFamily::ResourcePrice => {
                for (labels, shape, value) in metrics.resource_prices() {
                    series(&mut out, &name, labels, Some(shape), value);
                }
            }
            MetricFamily::MemoryUnitPrice | MetricFamily::VCpuUnitPrice => {
                for (labels, value) in metrics.unit_prices(family) {
                    series(&mut out, &name, labels, None, value);
                }
            }
        }
    }

    let name = format!("{NAMESPACE}_scrape_duration_seconds");
    header(&mut out, &name, "The scrape duration.", "gauge");
    let _ = writeln!(out, "{name} {}", snapshot.duration_secs);

    let name = format!("{NAMESPACE}_scrape_error");
    header(&mut out, &name, "Number of errors during the last scrape.", "gauge");
    let _ = writeln!(out, "{name} {}", snapshot.error_count);

    let name = format!("{NAMESPACE}_scrapes_total");
    header(&mut out, &name, "Total AWS price scrapes.", "counter");
    let _ = writeln!(out, "{name} {}", snapshot.scrapes_total);

    out
}

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn series(out: &mut String, name: &str, labels: &PriceLabels, shape: Option<&ShapeLabels>, value: f64) {
    let plan = labels.savings_plan.as_ref();
    let duration = plan.map(|p| p.duration_years.to_string()).unwrap_or_default();

    let mut pairs: Vec<(&str, &str)> = vec![
        ("instance_lifecycle", labels.lifecycle.as_str()),
        ("instance_type", labels.instance_type.as_str()),
        ("region", labels.region.as_str()),
        ("availability_zone", labels.availability_zone.as_deref().unwrap_or_default()),
        ("product_description", labels.product_description.as_deref().unwrap_or_default()),
        ("operating_system", labels.operating_system.as_deref().unwrap_or_default()),
        ("savings_plan_payment_option", plan.map_or("", |p| p.payment_option.as_str())),
        ("savings_plan_duration", duration.as_str()),
        ("savings_plan_type", plan.map_or("", |p| p.plan_type.as_str())),
    ];
    if let Some(shape) = shape {
        pairs.push(("memory", shape.memory.as_str()));
        pairs.push(("vcpu", shape.vcpu.as_str()));
    }

    out.push_str(name);
    out.push('{');
    for (i, (key, val)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{key}=\"{}\"", escape_label_value(val));
    }
    let _ = writeln!(out, "}} {value}");
}

/// Escape backslash, double quote, and newline.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_core::{InstanceShape, Lifecycle, PriceObservation, SavingsPlanTerms};

    use crate::metric_set::MetricSet;

    fn snapshot(observations: Vec<PriceObservation>) -> ScrapeSnapshot {
        ScrapeSnapshot {
            metrics: observations.into_iter().collect(),
            error_count: 2,
            duration_secs: 1.5,
            scrapes_total: 7,
        }
    }

    fn spot_labels() -> PriceLabels {
        PriceLabels::new(Lifecycle::Spot, "m5.large", "eu-west-1")
            .in_zone("eu-west-1a")
            .with_product_description("Linux/UNIX")
    }

    #[test]
    fn render_empty() {
        let output = render_prometheus(&ScrapeSnapshot::default());
        // Should still have type declarations.
        assert!(output.contains("# HELP aws_pricing_resource_price"));
        assert!(output.contains("# TYPE aws_pricing_resource_price gauge"));
        assert!(output.contains("# TYPE aws_pricing_resource_vcpu_unit_price gauge"));
        assert!(output.contains("# TYPE aws_pricing_scrapes_total counter"));
        assert!(output.contains("aws_pricing_scrapes_total 0\n"));
    }

    #[test]
    fn render_resource_price_with_shape_labels() {
        let output = render_prometheus(&snapshot(vec![PriceObservation::ResourcePrice {
            labels: spot_labels(),
            shape: pricing_core::ShapeLabels::from_shape(&InstanceShape::new("m5.large", 8192, 2)),
            value: 0.038,
        }]));

        assert!(output.contains(
            "aws_pricing_resource_price{instance_lifecycle=\"spot\",instance_type=\"m5.large\",\
             region=\"eu-west-1\",availability_zone=\"eu-west-1a\",product_description=\"Linux/UNIX\",\
             operating_system=\"\",savings_plan_payment_option=\"\",savings_plan_duration=\"\",\
             savings_plan_type=\"\",memory=\"8192\",vcpu=\"2\"} 0.038\n"
        ));
    }

    #[test]
    fn render_unit_price_without_shape_labels() {
        let labels = PriceLabels::new(Lifecycle::OnDemand, "m5.large", "eu-west-1").with_savings_plan(
            SavingsPlanTerms {
                payment_option: "No Upfront".into(),
                duration_years: 1,
                plan_type: "Compute".into(),
            },
        );
        let output = render_prometheus(&snapshot(vec![PriceObservation::VCpuUnitPrice {
            labels,
            value: 0.025,
        }]));

        let line = output
            .lines()
            .find(|l| l.starts_with("aws_pricing_resource_vcpu_unit_price{"))
            .unwrap();
        assert!(line.contains("savings_plan_payment_option=\"No Upfront\""));
        assert!(line.contains("savings_plan_duration=\"1\""));
        assert!(line.contains("availability_zone=\"\""));
        assert!(!line.contains("memory="));
        assert!(line.ends_with("} 0.025"));
    }

    #[test]
    fn render_self_metrics() {
        let output = render_prometheus(&snapshot(Vec::new()));
        assert!(output.contains("aws_pricing_scrape_duration_seconds 1.5\n"));
        assert!(output.contains("aws_pricing_scrape_error 2\n"));
        assert!(output.contains("aws_pricing_scrapes_total 7\n"));
    }

    #[test]
    fn label_values_are_escaped() {
        assert_eq!(escape_label_value(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_label_value("x\ny"), "x\\ny");
        assert_eq!(escape_label_value("Linux/UNIX (Amazon VPC)"), "Linux/UNIX (Amazon VPC)");
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let mut metrics = MetricSet::new();
        metrics.insert(PriceObservation::MemoryUnitPrice {
            labels: spot_labels(),
            value: 0.001,
        });
        let output = render_prometheus(&ScrapeSnapshot {
            metrics,
            ..ScrapeSnapshot::default()
        });

        // Every non-comment line should match: metric_name[{labels}] value
        for line in output.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (series, value) = line.rsplit_once(' ').unwrap();
            assert!(series.starts_with(NAMESPACE), "bad series: {line}");
            assert!(value.parse::<f64>().is_ok(), "bad value: {line}");
        }
    }
}
