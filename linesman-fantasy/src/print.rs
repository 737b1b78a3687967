use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::projection::PlayerProjection;

pub fn tabulate_projections(projections: &[PlayerProjection]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(4)).with(Left)),
            Col::new(Styles::default().with(MinWidth(5)).with(Left)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(Left)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Player".into(),
                "Pos".into(),
                "Team".into(),
                "Floor".into(),
                "Mid".into(),
                "Ceiling".into(),
                "Critical".into(),
                "Missing".into(),
            ],
        ));
    for projection in projections {
        let diagnostics = &projection.diagnostics;
        let missing = diagnostics
            .missing_vital
            .iter()
            .chain(diagnostics.fallback_vital.iter())
            .map(|market| short_name(market.key()))
            .collect::<Vec<_>>()
            .join(", ");
        table.push_row(Row::new(
            Styles::default(),
            vec![
                projection.name.clone().into(),
                projection.position.to_string().into(),
                projection.team.clone().unwrap_or_default().into(),
                format!("{:.2}", projection.floor).into(),
                format!("{:.2}", projection.mid).into(),
                format!("{:.2}", projection.ceiling).into(),
                if diagnostics.is_critical { "*" } else { "" }.into(),
                missing.into(),
            ],
        ));
    }
    table
}

pub fn tabulate_markets(projection: &PlayerProjection) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(16)).with(Left)),
            Col::new(Styles::default().with(MinWidth(9)).with(Left)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Market".into(),
                "Tier".into(),
                "Floor".into(),
                "Mid".into(),
                "Ceiling".into(),
                "Line".into(),
                "Over".into(),
                "Books".into(),
            ],
        ));
    for market in &projection.markets {
        let (line, over, books) = match &market.consensus {
            Some(summary) => (
                format!("{:.1}", summary.threshold),
                summary
                    .over_prob
                    .map(|prob| format!("{prob:.3}"))
                    .unwrap_or_else(|| "-".into()),
                summary.samples.to_string(),
            ),
            None => ("-".into(), "-".into(), "0".into()),
        };
        table.push_row(Row::new(
            Styles::default(),
            vec![
                short_name(market.market.key()).into(),
                market.tier.to_string().into(),
                format!("{:.2}", market.range.floor).into(),
                format!("{:.2}", market.range.mid).into(),
                format!("{:.2}", market.range.ceiling).into(),
                line.into(),
                over.into(),
                books.into(),
            ],
        ));
    }
    table
}

fn short_name(key: &str) -> &str {
    key.strip_prefix("player_").unwrap_or(key)
}
