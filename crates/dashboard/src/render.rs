use serde_json::{json, Value};

use fund_attribution_core::models::attribution::{AttributionReport, AttributionRow};
use fund_attribution_core::models::chart::{trend_color, BarDatum};
use fund_attribution_core::services::chart_service::ChartService;

pub const LEFT_LOGO: &str = "fintual-logo.png";
pub const RIGHT_LOGO: &str = "hayek-logo.png";

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const INTRADAY_CHART_HEIGHT: u32 = 400;

const STYLE: &str = r#"
<style>
  body { font-family: 'Poppins', sans-serif; margin: 0 auto; max-width: 1400px; padding: 24px; color: #31333f; }
  .title { font-family: 'Poppins', sans-serif; font-weight: 500; }
  .header { display: grid; grid-template-columns: 1fr 2fr 1fr; align-items: center; }
  .header .right { display: block; margin-left: auto; }
  .centered { text-align: center; width: 100%; }
  .subtitle { margin-top: 20px; font-size: 20px; color: #545e6d; font-weight: 350; }
  .headline { text-align: left; font-size: 28px; margin-top: 50px; }
  .charts { display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }
  .missing { color: #ee6c61; }
  table { width: 100%; border-collapse: collapse; }
  th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #eee; height: 23px; }
  .footer { font-size: 14px; color: #888888; margin: 50px 0; }
</style>
"#;

/// What the page needs besides the report.
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    pub fund_name: &'a str,
    pub left_logo: bool,
    pub right_logo: bool,
}

/// Percentage with two decimals from a fraction: 0.0123 → "1.23%".
pub fn format_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Signed percentage from a value already in percent: 1.2 → "+1.20%".
pub fn format_signed_pct(pct: f64) -> String {
    format!("{pct:+.2}%")
}

fn format_price(price: Option<f64>) -> String {
    price.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".to_string())
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON safe to inline in a `<script>` element.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Line chart of the intraday cumulative return, coloured by its last value.
pub fn intraday_figure(report: &AttributionReport) -> Value {
    let x: Vec<&str> = report.intraday.iter().map(|p| p.timestamp.as_str()).collect();
    let y: Vec<f64> = report.intraday.iter().map(|p| p.return_pct).collect();
    let color = trend_color(report.latest_intraday_pct().unwrap_or(0.0));

    json!({
        "data": [{
            "type": "scatter",
            "mode": "lines",
            "x": x,
            "y": y,
            "line": { "color": color, "width": 2 },
            "hovertemplate": "%{x}<br>%{y:.2f}%<extra></extra>",
        }],
        "layout": {
            "height": INTRADAY_CHART_HEIGHT,
            "margin": { "l": 0, "r": 0, "t": 20, "b": 20 },
            "yaxis": {
                "title": { "text": "Rendimiento (%)" },
                "gridcolor": "rgba(0,0,0,0.1)",
                "zerolinecolor": "rgba(0,0,0,0.2)",
                "automargin": true,
            },
            "xaxis": { "gridcolor": "rgba(0,0,0,0.1)" },
            "showlegend": false,
            "plot_bgcolor": "white",
        },
    })
}

/// Horizontal bar chart of contributions in percent.
pub fn bar_figure(bars: &[BarDatum], height: u32, every_tick: bool) -> Value {
    let x: Vec<f64> = bars.iter().map(|b| b.value_pct).collect();
    let y: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
    let colors: Vec<&str> = bars.iter().map(BarDatum::color).collect();
    let text: Vec<String> = bars.iter().map(|b| format_signed_pct(b.value_pct)).collect();

    let mut yaxis = json!({ "automargin": true });
    if every_tick {
        yaxis["tickmode"] = json!("linear");
        yaxis["dtick"] = json!(1);
    }

    json!({
        "data": [{
            "type": "bar",
            "orientation": "h",
            "x": x,
            "y": y,
            "marker": { "color": colors },
            "text": text,
            "textposition": "auto",
        }],
        "layout": {
            "height": height,
            "margin": { "l": 0, "r": 0, "t": 20, "b": 20 },
            "xaxis": { "title": { "text": "Contribución (%)" } },
            "yaxis": yaxis,
            "showlegend": false,
            "plot_bgcolor": "white",
        },
    })
}

fn plot(id: &str, figure: &Value) -> String {
    format!(
        "<div id=\"{id}\"></div>\n<script>(function() {{ const fig = {}; \
         Plotly.newPlot('{id}', fig.data, fig.layout, {{ responsive: true, displayModeBar: false }}); }})();</script>\n",
        script_json(figure)
    )
}

fn logo(file: &str, present: bool, class: &str) -> String {
    if present {
        format!("<img src=\"/assets/{file}\" width=\"150\" class=\"{class}\" />")
    } else {
        format!(
            "<p class=\"missing\">No se encontró el logo. Asegúrate de que '{file}' esté en el directorio de recursos.</p>"
        )
    }
}

fn page_head(ctx: &PageContext<'_>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\" />\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    html.push_str(&format!("<title>{} 🌶️</title>\n", escape_html(ctx.fund_name)));
    html.push_str(&format!("<script src=\"{PLOTLY_CDN}\"></script>\n"));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    html.push_str("<div class=\"header\">\n");
    html.push_str(&logo(LEFT_LOGO, ctx.left_logo, "left"));
    html.push_str("<div></div>\n");
    html.push_str(&logo(RIGHT_LOGO, ctx.right_logo, "right"));
    html.push_str("</div>\n");

    let name = escape_html(ctx.fund_name);
    html.push_str(&format!(
        "<div class=\"centered\" style=\"margin-top: 50px;\"><h1 class=\"title\">Cómo va {name} 🌶️</h1></div>\n"
    ));
    html.push_str(&format!(
        "<div class=\"centered\"><p class=\"subtitle\">Rendimientos intradía no oficiales del fondo {name}.</p></div>\n"
    ));
    html
}

fn page_footer(ctx: &PageContext<'_>) -> String {
    let name = escape_html(ctx.fund_name);
    format!(
        "<div class=\"centered footer\"><p>¿Quién es {name}? {name} es un fondo de inversión que invierte en \
         acciones de todo el mundo. Estos rendimientos se calculan con precios retrasados y no son oficiales.</p></div>\n\
         </body>\n</html>\n"
    )
}

fn breakdown_row(row: &AttributionRow) -> String {
    let colored = |value: Option<f64>| match value {
        Some(v) => format!("<td style=\"color: {};\">{}</td>", trend_color(v), format_pct(v)),
        None => "<td>-</td>".to_string(),
    };
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>{}{}</tr>\n",
        escape_html(&row.name),
        format_pct(row.weight),
        format_price(row.start_price),
        format_price(row.end_price),
        colored(row.return_usd),
        colored(row.return_mxn),
    )
}

/// The full dashboard page.
pub fn render_page(report: &AttributionReport, ctx: &PageContext<'_>) -> String {
    let charts = ChartService::new();
    let mut html = page_head(ctx);

    let total = report.totals.total_return_mxn;
    html.push_str(&format!(
        "<p class=\"headline\">Hasta ahora el rendimiento de {} es <span style=\"color: {};\">{}</span></p>\n",
        escape_html(ctx.fund_name),
        trend_color(total),
        format_pct(total),
    ));

    html.push_str("<h3>Rendimiento en vivo 🔥</h3>\n");
    html.push_str(&plot("intraday-chart", &intraday_figure(report)));

    let contribution = charts.contribution_chart(report);
    html.push_str("<h3>Contribución por tipo</h3>\n<div class=\"charts\">\n<div>\n");
    html.push_str(&plot("type-chart", &bar_figure(&contribution.by_type, contribution.height, false)));
    html.push_str("</div>\n<div>\n");
    html.push_str(&plot(
        "instrument-chart",
        &bar_figure(&contribution.by_instrument, contribution.height, true),
    ));
    html.push_str("</div>\n</div>\n");

    let rows = charts.breakdown_rows(report);
    html.push_str("<h3>Desglose por instrumento</h3>\n");
    html.push_str(&format!(
        "<div style=\"max-height: {}px; overflow-y: auto;\">\n<table>\n",
        charts.table_height(rows.len())
    ));
    html.push_str(
        "<thead><tr><th>Instrumento</th><th>Peso (%)</th><th>Precio Inicial</th>\
         <th>Precio Actual</th><th>Rendimiento USD</th><th>Rendimiento MXN</th></tr></thead>\n<tbody>\n",
    );
    for row in rows {
        html.push_str(&breakdown_row(row));
    }
    html.push_str("</tbody>\n</table>\n</div>\n");

    html.push_str(&format!(
        "<p class=\"footer\">Del {} al {} · USD/MXN {:.4} → {:.4} ({})</p>\n",
        report.start_date,
        report.end_date,
        report.fx_start,
        report.fx_end,
        format_pct(report.fx_return()),
    ));

    html.push_str(&page_footer(ctx));
    html
}

/// Page shown when the report cannot be computed.
pub fn render_error_page(message: &str, ctx: &PageContext<'_>) -> String {
    let mut html = page_head(ctx);
    html.push_str(&format!(
        "<div class=\"centered\"><p class=\"missing\">No pudimos cargar los datos en este momento.</p>\
         <p>{}</p></div>\n",
        escape_html(message)
    ));
    html.push_str(&page_footer(ctx));
    html
}
