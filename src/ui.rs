use crate::app::Greeting;
use crate::mode::Mode;
use crate::render::{BrailleLayer, PixelCanvas};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::*,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const BINARY: [&str; 2] = [
    "01001101 01100101 01110010 01110010 01111001",
    "01011000 01101101 01100001 01110011",
];

#[derive(Clone, Copy)]
struct Palette {
    pink: Color,
    gold: Color,
    text: Color,
    dim: Color,
    faint: Color,
    panel: Color,
}

impl Palette {
    fn new(mono: bool) -> Self {
        if mono {
            Self {
                pink: Color::White,
                gold: Color::White,
                text: Color::White,
                dim: Color::Gray,
                faint: Color::DarkGray,
                panel: Color::Black,
            }
        } else {
            Self {
                pink: Color::Rgb(244, 114, 182),
                gold: Color::Rgb(250, 204, 21),
                text: Color::Rgb(235, 235, 245),
                dim: Color::Rgb(120, 124, 150),
                faint: Color::Rgb(45, 50, 75),
                panel: Color::Rgb(6, 8, 20),
            }
        }
    }
}

/// Everything but the particles sits on top of the braille layer.
pub(crate) fn draw(
    f: &mut Frame,
    canvas: &PixelCanvas,
    greeting: &Greeting,
    mono: bool,
    time: f32,
) {
    let area = f.size();
    let pal = Palette::new(mono);

    f.render_widget(BrailleLayer { canvas, mono }, area);
    render_decorations(f, area, &pal);

    match greeting.mode() {
        Mode::Input => render_form(f, area, greeting, &pal, time),
        Mode::Transition => render_assembling(f, area, &pal, time),
        Mode::Display => render_reveal(f, area, greeting, &pal),
    }
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

fn panel(pal: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(pal.faint))
        .style(Style::default().bg(pal.panel))
}

fn render_decorations(f: &mut Frame, area: Rect, pal: &Palette) {
    if area.height < 6 {
        return;
    }
    if area.width >= 100 {
        let lines: Vec<Line> = BINARY
            .iter()
            .map(|s| Line::styled(*s, Style::default().fg(pal.faint)))
            .collect();
        f.render_widget(Paragraph::new(lines), Rect::new(area.x + 2, area.y + 1, 46, 2));
    }

    let tag = " 专属于程序员的浪漫 ";
    let tag_w = 22u16;
    if area.width > tag_w + 4 {
        f.render_widget(
            Paragraph::new(Line::styled(tag, Style::default().fg(pal.dim))).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(pal.faint)),
            ),
            Rect::new(area.x + area.width - tag_w - 2, area.y, tag_w, 3),
        );
    }

    f.render_widget(
        Paragraph::new(Line::styled(
            "M E R R Y   C H R I S T M A S",
            Style::default().fg(pal.faint).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Rect::new(area.x, area.y + area.height - 1, area.width, 1),
    );
}

fn render_form(f: &mut Frame, area: Rect, g: &Greeting, pal: &Palette, time: f32) {
    let rect = centered(area, 52, 13);
    f.render_widget(Clear, rect);

    let field = if g.name().is_empty() {
        Line::styled("键入您的姓名以解构惊喜...", Style::default().fg(pal.dim))
    } else {
        Line::from(vec![
            Span::styled(g.name(), Style::default().fg(pal.text).add_modifier(Modifier::BOLD)),
            Span::styled("▏", Style::default().fg(pal.pink)),
        ])
    };

    let action = if g.is_loading() {
        let spin = SPINNER[(time * 12.0) as usize % SPINNER.len()];
        Line::styled(format!("{spin} 编译惊喜中..."), Style::default().fg(pal.gold))
    } else {
        Line::from(vec![
            Span::styled("[ Enter ] ", Style::default().fg(pal.dim)),
            Span::styled(
                "执行代码 · 开启奇迹",
                Style::default().fg(pal.gold).add_modifier(Modifier::BOLD),
            ),
        ])
    };

    let lines = vec![
        Line::raw(""),
        Line::styled(
            "圣诞快乐",
            Style::default().fg(pal.pink).add_modifier(Modifier::BOLD),
        ),
        Line::styled(
            "Technological Christmas Magic",
            Style::default().fg(pal.dim).add_modifier(Modifier::ITALIC),
        ),
        Line::raw(""),
        field,
        Line::styled("─".repeat(30), Style::default().fg(pal.faint)),
        Line::raw(""),
        action,
        Line::raw(""),
        Line::styled("Esc 退出", Style::default().fg(pal.faint)),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(panel(pal)),
        rect,
    );
}

fn render_assembling(f: &mut Frame, area: Rect, pal: &Palette, time: f32) {
    let lit = (time * 3.0) as usize % 3;
    let dots: Vec<Span> = (0..3)
        .map(|i| {
            let c = if i == lit { pal.pink } else { pal.faint };
            Span::styled("● ", Style::default().fg(c))
        })
        .collect();

    let lines = vec![
        Line::styled(
            "正在为您构建数字森林...",
            Style::default().fg(pal.text).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::from(dots),
    ];
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered(area, area.width, 3),
    );
}

fn render_reveal(f: &mut Frame, area: Rect, g: &Greeting, pal: &Palette) {
    let (left, right) = g.halves();
    let panel_w = (area.width / 3).clamp(16, 44);
    let panel_h = area.height.saturating_sub(6).min(18);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(panel_w),
            Constraint::Min(0),
            Constraint::Length(panel_w),
            Constraint::Length(2),
        ])
        .split(area);
    let left_rect = centered(cols[1], cols[1].width, panel_h);
    let right_rect = centered(cols[3], cols[3].width, panel_h);

    let body = Style::default().fg(pal.text);

    let mut l_lines = vec![
        Line::styled(
            format!("▍Hello, {}", g.name()),
            Style::default().fg(pal.pink).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
    ];
    l_lines.extend(left.lines().map(|s| Line::styled(s, body)));

    let mut r_lines: Vec<Line> = right.lines().map(|s| Line::styled(s, body)).collect();
    r_lines.push(Line::raw(""));
    r_lines.push(Line::styled(
        "Merry Christmas ▍",
        Style::default().fg(pal.gold).add_modifier(Modifier::BOLD),
    ));
    r_lines.push(Line::raw(""));
    r_lines.push(Line::styled("r 重启魔法循环 · q 退出", Style::default().fg(pal.faint)));

    f.render_widget(Clear, left_rect);
    f.render_widget(
        Paragraph::new(l_lines)
            .wrap(Wrap { trim: false })
            .block(panel(pal)),
        left_rect,
    );
    f.render_widget(Clear, right_rect);
    f.render_widget(
        Paragraph::new(r_lines)
            .alignment(Alignment::Right)
            .wrap(Wrap { trim: false })
            .block(panel(pal)),
        right_rect,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Reply;
    use crate::blessing::fallback_on_error;
    use crate::sim::Surface;
    use ratatui::backend::TestBackend;
    use std::time::Instant;

    fn screen(g: &Greeting, w: u16, h: u16) -> String {
        let mut canvas = PixelCanvas::for_cells(w, h);
        canvas.clear(crate::particle::Rgb::NIGHT);
        let mut term = Terminal::new(TestBackend::new(w, h)).unwrap();
        term.draw(|f| draw(f, &canvas, g, false, 0.0)).unwrap();
        let buf = term.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf.get(x, y).symbol());
            }
            out.push('\n');
        }
        out.replace(' ', "")
    }

    fn typed(name: &str) -> Greeting {
        let mut g = Greeting::new();
        for ch in name.chars() {
            g.push_char(ch);
        }
        g
    }

    #[test]
    fn form_shows_title_and_placeholder() {
        let s = screen(&Greeting::new(), 120, 40);
        assert!(s.contains("圣诞快乐"));
        assert!(s.contains("键入您的姓名以解构惊喜..."));
        assert!(s.contains("执行代码·开启奇迹"));
        assert!(s.contains("专属于程序员的浪漫"));
    }

    #[test]
    fn form_shows_typed_name_and_loading() {
        let mut g = typed("小雪");
        assert!(screen(&g, 100, 30).contains("小雪"));
        g.submit();
        assert!(screen(&g, 100, 30).contains("编译惊喜中..."));
    }

    #[test]
    fn reveal_shows_both_halves() {
        let mut g = typed("陈祖云");
        let req = g.submit().unwrap();
        let t0 = Instant::now();
        g.accept(
            Reply {
                generation: req.generation,
                text: fallback_on_error("陈祖云"),
            },
            t0,
        );
        assert!(screen(&g, 120, 40).contains("正在为您构建数字森林..."));

        g.poll(t0 + crate::mode::REVEAL_DELAY);
        let s = screen(&g, 120, 40);
        assert!(s.contains("Hello,陈祖云"));
        assert!(s.contains("MerryChristmas"));
        assert!(s.contains("——陈祖云"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        screen(&Greeting::new(), 8, 3);
        let mut g = typed("a");
        let req = g.submit().unwrap();
        let t0 = Instant::now();
        g.accept(
            Reply {
                generation: req.generation,
                text: "x，y".into(),
            },
            t0,
        );
        g.poll(t0 + crate::mode::REVEAL_DELAY);
        screen(&g, 10, 4);
    }
}
