//! `iosim converge`: link status and routing tables for a whole topology.

use serde::Serialize;
use tabled::Tabled;

use iosim_core::{ConvergenceReport, DeviceConfig, Route, RouteSource, Topology, converge};

use crate::cli::ConvergeArgs;
use crate::commands::Context;
use crate::error::CliError;
use crate::output;
use crate::snapshot;

#[derive(Debug, Serialize)]
struct ConvergeView<'a> {
    report: &'a ConvergenceReport,
    topology: &'a Topology,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Endpoint A")]
    a: String,
    #[tabled(rename = "Endpoint B")]
    b: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Code")]
    code: &'static str,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Next Hop")]
    next_hop: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Hops")]
    hops: u32,
}

fn route_code(device: &DeviceConfig, route: &Route) -> &'static str {
    match route.source {
        RouteSource::Static => "S",
        RouteSource::Connected => "C",
        RouteSource::Dynamic => device.dynamic_protocol().code(),
    }
}

fn route_rows(topology: &Topology) -> Vec<RouteRow> {
    let mut rows = Vec::new();
    for (id, device) in &topology.devices {
        let mut routes: Vec<&Route> = device.routes.iter().collect();
        routes.sort_by_key(|r| (r.destination, r.hops));
        rows.extend(routes.into_iter().map(|route| RouteRow {
            device: format!("{} ({id})", device.hostname),
            code: route_code(device, route),
            destination: route.destination.to_string(),
            next_hop: route
                .next_hop
                .map_or_else(|| "-".into(), |ip| ip.to_string()),
            interface: route.interface.clone().unwrap_or_else(|| "-".into()),
            hops: route.hops,
        }));
    }
    rows
}

fn render_text(view: &ConvergeView<'_>, color: bool) -> String {
    let mut sections = Vec::new();

    if view.topology.links.is_empty() {
        sections.push("No links.".to_owned());
    } else {
        let rows: Vec<LinkRow> = view
            .topology
            .links
            .iter()
            .map(|link| LinkRow {
                a: link.a.to_string(),
                b: link.b.to_string(),
                status: output::status_word(link.status.is_up(), color),
            })
            .collect();
        sections.push(output::render_table(&rows));
    }

    let routes = route_rows(view.topology);
    if routes.is_empty() {
        sections.push("No routes.".to_owned());
    } else {
        sections.push(output::render_table(&routes));
    }

    let report = view.report;
    let summary = if report.converged {
        format!(
            "Converged in {} rounds: {} links up, {} down",
            report.iterations, report.links_up, report.links_down
        )
    } else {
        output::warning(
            &format!(
                "Stopped after {} rounds without converging; routing tables may be incomplete",
                report.iterations
            ),
            color,
        )
    };
    sections.push(summary);

    sections.join("\n\n")
}

pub fn handle(args: &ConvergeArgs, ctx: &Context) -> Result<(), CliError> {
    let options = ctx.convergence()?;
    let topology = snapshot::read_topology(&args.topology)?;

    let converged = converge(topology, &options);

    if args.write {
        snapshot::write(&args.topology, &converged.topology)?;
    }

    let view = ConvergeView {
        report: &converged.report,
        topology: &converged.topology,
    };
    let out = output::render_single(ctx.format, &view, |v| render_text(v, ctx.color))?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use iosim_core::{ConvergenceOptions, Endpoint};

    fn lab() -> Topology {
        let mut a = DeviceConfig::router("A");
        let mut b = DeviceConfig::router("B");
        for (device, addr) in [(&mut a, "10.0.0.1/30"), (&mut b, "10.0.0.2/30")] {
            let port = device.interfaces.get_mut("GigabitEthernet0/0").unwrap();
            port.shutdown = false;
            port.address = Some(addr.parse().unwrap());
        }
        Topology::new()
            .with_device("a", a)
            .with_device("b", b)
            .with_link(
                Endpoint::new("a", "GigabitEthernet0/0"),
                Endpoint::new("b", "GigabitEthernet0/0"),
            )
    }

    #[test]
    fn text_lists_links_routes_and_summary() {
        let converged = converge(lab(), &ConvergenceOptions::default());
        let view = ConvergeView {
            report: &converged.report,
            topology: &converged.topology,
        };
        let text = render_text(&view, false);

        assert!(text.contains("Endpoint A"));
        assert!(text.contains("│ up "));
        assert!(text.contains("10.0.0.0/30"));
        assert!(text.contains("A (a)"));
        assert!(text.contains("1 links up, 0 down"));
    }

    #[test]
    fn empty_topology_says_so() {
        let converged = converge(Topology::new(), &ConvergenceOptions::default());
        let view = ConvergeView {
            report: &converged.report,
            topology: &converged.topology,
        };
        let text = render_text(&view, false);
        assert!(text.starts_with("No links.\n\nNo routes."));
    }
}
