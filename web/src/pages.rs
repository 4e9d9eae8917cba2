//! Server-rendered HTML pages, built from Leptos components.
//!
//! Leptos escapes every text node and attribute it renders.  Labels coming
//! out of `camsrv_common` are already HTML-escaped, so they are placed with
//! `inner_html` as text and decoded with [`unescape`] before they go into
//! an attribute.

use leptos::prelude::*;
use leptos::tachys::view::RenderHtml;

use camsrv_common::heatmap::Heatmap;
use camsrv_common::html::unescape;
use camsrv_common::settings::{CameraSettings, MenuEntry, Settings};
use camsrv_common::video_list::{RecordingDay, RecordingList};

/// Stylesheet served at `/resource/style.css`.
pub const STYLESHEET: &str = include_str!("../resource/style.css");

/// Heat map of one camera.
#[derive(Debug, Clone)]
pub struct CameraHeatmap {
    pub camera: String,
    pub title: String,
    pub heatmap: Heatmap,
}

pub struct ViewPage<'a> {
    pub camera: &'a CameraSettings,
    pub recordings: &'a RecordingList,
    pub recording: Option<i64>,
    /// Escaped URL of the selected recording.
    pub recording_url: Option<&'a str>,
}

fn render<V: IntoView>(page: impl FnOnce() -> V) -> String {
    let html = Owner::new().with(|| page().to_html());
    format!("<!DOCTYPE html>\n{html}")
}

/// `de_DE.UTF-8` → `de`.
fn html_lang(locale: Option<&str>) -> String {
    locale
        .and_then(|l| l.split(['_', '.', '@']).next())
        .filter(|l| !l.is_empty() && *l != "C" && *l != "POSIX")
        .unwrap_or("en")
        .to_string()
}

// ─── Components ──────────────────────────────────────────────────────────────

/// Shared header, navigation and footer.
#[component]
fn Layout(
    /// Site title from `webinterface.title`.
    site: String,
    lang: String,
    page_title: String,
    /// Camera links, labels already escaped.
    menu: Vec<MenuEntry>,
    /// Whether the overview link is the current page.
    #[prop(optional)]
    overview: bool,
    children: Children,
) -> impl IntoView {
    let links: Vec<_> = menu
        .into_iter()
        .map(|entry| {
            let href = format!("/view?camera={}", unescape(&entry.id));
            view! {
                <li>
                    <a href=href aria-current=entry.selected.then_some("page") inner_html=entry.title></a>
                </li>
            }
        })
        .collect();
    let document_title = format!("{site} - {page_title}");

    view! {
        <html lang=lang>
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
                <title>{document_title}</title>
                <link rel="stylesheet" href="/resource/style.css"/>
            </head>
            <body>
                <main>
                    <nav>
                        <ul>
                            <li><strong>{site}</strong></li>
                        </ul>
                        <ul>
                            <li>
                                <a href="/" aria-current=overview.then_some("page")>"Overview"</a>
                            </li>
                            {links}
                        </ul>
                    </nav>
                    <article>
                        <header>{page_title}</header>
                        {children()}
                    </article>
                </main>
            </body>
        </html>
    }
}

/// Day × hour grid; a cell with recordings links to the first of them.
#[component]
fn HeatmapTable(camera: String, heatmap: Heatmap) -> impl IntoView {
    let Heatmap { columns, rows } = heatmap;

    let header: Vec<_> = columns
        .into_iter()
        .map(|column| view! { <th scope="col" inner_html=column></th> })
        .collect();

    let rows: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let cells: Vec<_> = row
                .cells
                .into_iter()
                .map(|cell| {
                    let linked = cell.first_id.is_some();
                    let title = format!("{} motion events", unescape(&cell.motion_label));
                    let style = format!("background-color: {}", unescape(&cell.color));
                    view! {
                        <td
                            role=linked.then_some("button")
                            tabindex=linked.then_some("0")
                            data-camera=linked.then(|| camera.clone())
                            data-recording=cell.first_id.map(|id| id.to_string())
                            title=title
                            style=style
                        >
                            <span class="visually-hidden" inner_html=cell.motion_label></span>
                        </td>
                    }
                })
                .collect();

            view! {
                <tr>
                    <th scope="row" inner_html=row.date></th>
                    {cells}
                </tr>
            }
        })
        .collect();

    view! {
        <div class="overflow-auto">
            <table>
                <thead>
                    <tr>
                        <th scope="col">"Date"</th>
                        {header}
                    </tr>
                </thead>
                <tbody>{rows}</tbody>
            </table>
        </div>
    }
}

#[component]
fn CameraSection(entry: CameraHeatmap) -> impl IntoView {
    let CameraHeatmap {
        camera,
        title,
        heatmap,
    } = entry;

    let body = if heatmap.is_empty() {
        view! {
            <p class="no-data">"No recordings with a motion index available for this camera."</p>
        }
        .into_any()
    } else {
        view! { <HeatmapTable camera=camera.clone() heatmap=heatmap/> }.into_any()
    };

    view! {
        <section class="camera-heatmap" data-camera=camera>
            <h3>{title}</h3>
            {body}
        </section>
    }
}

/// Recording selector; the newest recording is at the top, below "Live View".
#[component]
fn RecordingSelector(
    days: Vec<RecordingDay>,
    selected: Option<i64>,
    stream_enabled: bool,
    /// Tint each recording with its motion color.
    colored: bool,
) -> impl IntoView {
    let groups: Vec<_> = days
        .into_iter()
        .map(|day| {
            let options: Vec<_> = day
                .entries
                .into_iter()
                .map(|entry| {
                    let style = colored
                        .then(|| format!("background-color: {}", unescape(&entry.color)));
                    view! {
                        <option
                            value=entry.id.to_string()
                            style=style
                            selected=selected == Some(entry.id)
                            inner_html=entry.time_label
                        ></option>
                    }
                })
                .collect();

            view! { <optgroup label=unescape(&day.date)>{options}</optgroup> }
        })
        .collect();

    view! {
        <fieldset role="group">
            <button id="previous" aria-label="Previous recording" title="Previous recording">"<<"</button>
            <select id="date" class="recording-selector" aria-label="Select recording">
                <option value="" disabled=!stream_enabled selected=selected.is_none()>"Live View"</option>
                {groups}
            </select>
            <button id="next" aria-label="Next recording" title="Next recording">">>"</button>
        </fieldset>
    }
}

#[component]
fn Player(source: String, live: bool) -> impl IntoView {
    view! {
        <div class="video-container">
            <video id="video" controls=!live autoplay=true preload="auto">
                <source src=source type="video/mp4"/>
                <p>"To view the recordings, use a browser that supports HTML5 video."</p>
            </video>
        </div>
    }
}

// ─── Pages ───────────────────────────────────────────────────────────────────

/// Overview page; `heatmaps` is `None` when the heat map is disabled.
pub fn overview(settings: &Settings, heatmaps: Option<Vec<CameraHeatmap>>) -> String {
    let site = settings.title.clone();
    let lang = html_lang(settings.locale.as_deref());
    let menu = settings.menu("");

    let content = match heatmaps {
        None => view! { <p class="center">"Please select a camera."</p> }.into_any(),
        Some(heatmaps) => {
            let sections: Vec<_> = heatmaps
                .into_iter()
                .map(|entry| view! { <CameraSection entry=entry/> })
                .collect();
            view! {
                <div class="heatmap-container">{sections}</div>
                <script inner_html=HEATMAP_SCRIPT></script>
            }
            .into_any()
        }
    };

    render(move || {
        view! {
            <Layout site=site lang=lang page_title="Overview".to_string() menu=menu overview=true>
                {content}
            </Layout>
        }
    })
}

const HEATMAP_SCRIPT: &str = r#"
document.querySelectorAll('td[data-recording]').forEach(cell => {
  const open = () => {
    const params = new URLSearchParams({ camera: cell.dataset.camera, recording: cell.dataset.recording });
    window.location.href = `/view?${params}`;
  };
  cell.addEventListener('click', open);
  cell.addEventListener('keydown', e => {
    if (e.key === 'Enter' || e.key === ' ') { e.preventDefault(); open(); }
  });
});
"#;

/// Recording viewer with the recording selector and the player.
pub fn view(settings: &Settings, page: &ViewPage<'_>) -> String {
    let selected = page.recording.is_some() && page.recording_url.is_some();
    let show_video = settings.stream_enabled || selected;
    let live_view = settings.stream_enabled && page.recording.is_none();

    let player = if show_video {
        let source = match page.recording_url {
            Some(url) if selected => unescape(url),
            _ => format!("/live?camera={}", page.camera.id),
        };
        view! { <Player source=source live=live_view/> }.into_any()
    } else {
        view! {
            <div class="no-video-message"><p>"No video available."</p></div>
        }
        .into_any()
    };

    // JSON string literal; `</` is broken up so the id cannot close the tag.
    let camera_js = serde_json::to_string(&page.camera.id)
        .unwrap_or_else(|_| "\"\"".into())
        .replace("</", "<\\/");
    let script = format!("const camera = {camera_js};{VIEWER_SCRIPT}");

    let site = settings.title.clone();
    let lang = html_lang(settings.locale.as_deref());
    let menu = settings.menu(&page.camera.id);
    let page_title = page.camera.title.clone();
    let days = page.recordings.days().to_vec();
    let recording = page.recording;
    let stream_enabled = settings.stream_enabled;
    let colored = settings.heatmap_enabled;

    render(move || {
        view! {
            <Layout site=site lang=lang page_title=page_title menu=menu>
                <RecordingSelector
                    days=days
                    selected=recording
                    stream_enabled=stream_enabled
                    colored=colored
                />
                {player}
                <script inner_html=script></script>
            </Layout>
        }
    })
}

/// Selector navigation: newest recording is at the top, so "previous"
/// moves down the list.
const VIEWER_SCRIPT: &str = r#"
const select = document.getElementById('date');
const go = value => {
  const params = new URLSearchParams({ camera });
  if (value) params.append('recording', value);
  window.location.href = `/view?${params}`;
};
const step = delta => {
  const next = select.selectedIndex + delta;
  if (next < 0 || next >= select.length || select.options[next].disabled) return;
  select.selectedIndex = next;
  go(select.value);
};
select.addEventListener('change', e => go(e.target.value));
document.getElementById('previous').addEventListener('click', () => step(1));
document.getElementById('next').addEventListener('click', () => step(-1));
document.addEventListener('keydown', e => {
  if (e.target.tagName === 'SELECT') return;
  if (e.key === 'ArrowLeft') step(1);
  if (e.key === 'ArrowRight') step(-1);
});
"#;
