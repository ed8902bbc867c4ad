use anyhow::{ensure, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::{
    collections::VecDeque,
    f64::consts::TAU,
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

const DAYS_PER_YEAR: f64 = 365.25;

// -------------------- Config --------------------
struct Config {
    zoom_init: f64, // cells per AU
    zoom_min: f64,
    zoom_max: f64,
    time_scale_init: f64, // simulated days per real second
    time_scale_min: f64,
    time_scale_max: f64,
    trail_cap: usize,
    fps_cap: u64,
    show_trails: bool,
    show_labels: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom_init: 12.0,
            zoom_min: 0.8,
            zoom_max: 240.0,
            time_scale_init: 20.0,
            time_scale_min: 0.1,
            time_scale_max: 2000.0,
            trail_cap: 600,
            fps_cap: 60,
            show_trails: true,
            show_labels: true,
        }
    }
}

// -------------------- Colors --------------------
const BACKGROUND: Color = Color::Rgb { r: 10, g: 10, b: 12 };
const WHITE: Color = Color::Rgb { r: 245, g: 245, b: 245 };
const GRAY: Color = Color::Rgb { r: 70, g: 70, b: 80 };
const MERCURY_GRAY: Color = Color::Rgb { r: 150, g: 150, b: 150 };
const BLUE: Color = Color::Rgb { r: 90, g: 140, b: 220 };
const CYAN: Color = Color::Rgb { r: 80, g: 200, b: 200 };
const YELLOW: Color = Color::Rgb { r: 250, g: 200, b: 70 };
const ORANGE: Color = Color::Rgb { r: 255, g: 160, b: 90 };
const RED: Color = Color::Rgb { r: 220, g: 80, b: 80 };
const PURPLE: Color = Color::Rgb { r: 160, g: 120, b: 200 };

// -------------------- Orbital mechanics (first-order Kepler) --------------------
#[derive(Clone, Copy)]
struct Orbit {
    a_au: f64,         // semi-major axis, AU
    period_years: f64, // orbital period, Earth years
    e: f64,            // eccentricity
    phi0: f64,         // initial phase, radians
}

impl Orbit {
    fn mean_motion(&self) -> f64 {
        TAU / self.period_years
    }
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

fn days_to_years(days: f64) -> f64 {
    days / DAYS_PER_YEAR
}

/// Mean anomaly M(t) = n*t + phi0, normalized into [0, 2pi).
fn mean_anomaly(t_years: f64, orbit: &Orbit) -> f64 {
    (orbit.mean_motion() * t_years + orbit.phi0).rem_euclid(TAU)
}

/// Position on the ellipse from mean anomaly, using E = M + e*sin(M)
/// instead of a Newton solve. Keeps per-frame cost flat; error is small
/// for the catalog's eccentricities (all below 0.25).
fn elliptical_position(a: f64, e: f64, m: f64) -> (f64, f64) {
    let big_e = m + e * m.sin();
    let x = a * (big_e.cos() - e);
    let y = a * (1.0 - e * e).sqrt() * big_e.sin();
    (x, y)
}

/// Planar offset (x, y) in AU from the Sun at the given simulation day.
fn orbital_position_au(sim_days: f64, orbit: &Orbit) -> (f64, f64) {
    let m = mean_anomaly(days_to_years(sim_days), orbit);
    elliptical_position(orbit.a_au, orbit.e, m)
}

// Simplified catalog: a [AU], P [years], e, phi0. Values rounded to keep
// the motion smooth and educational rather than ephemeris-grade.
fn orbit_catalog() -> [(&'static str, Orbit); 8] {
    [
        ("Mercury", Orbit { a_au: 0.387, period_years: 0.241, e: 0.206, phi0: 0.2 }),
        ("Venus", Orbit { a_au: 0.723, period_years: 0.615, e: 0.007, phi0: 0.1 }),
        ("Earth", Orbit { a_au: 1.000, period_years: 1.000, e: 0.017, phi0: 0.0 }),
        ("Mars", Orbit { a_au: 1.524, period_years: 1.881, e: 0.093, phi0: 1.0 }),
        ("Jupiter", Orbit { a_au: 5.203, period_years: 11.86, e: 0.049, phi0: 1.5 }),
        ("Saturn", Orbit { a_au: 9.537, period_years: 29.45, e: 0.056, phi0: 2.0 }),
        ("Uranus", Orbit { a_au: 19.191, period_years: 84.02, e: 0.047, phi0: 0.4 }),
        ("Neptune", Orbit { a_au: 30.07, period_years: 164.8, e: 0.009, phi0: 3.1 }),
    ]
}

fn validate_catalog(catalog: &[(&str, Orbit)]) -> Result<()> {
    for (name, orbit) in catalog {
        ensure!(orbit.a_au > 0.0, "{name}: semi-major axis must be positive");
        ensure!(orbit.period_years > 0.0, "{name}: orbital period must be positive");
        ensure!((0.0..1.0).contains(&orbit.e), "{name}: eccentricity out of [0, 1)");
    }
    Ok(())
}

// -------------------- Camera --------------------
#[derive(Clone, Copy)]
struct Camera {
    zoom: f64,          // cells per AU
    offset: (f64, f64), // screen translation, cells
}

impl Camera {
    // Screen Y grows downward, world Y up.
    fn world_to_screen(&self, wx: f64, wy: f64, center: (f64, f64)) -> (f64, f64) {
        (
            center.0 + wx * self.zoom + self.offset.0,
            center.1 - wy * self.zoom + self.offset.1,
        )
    }

    fn screen_to_world(&self, sx: f64, sy: f64, center: (f64, f64)) -> (f64, f64) {
        (
            (sx - center.0 - self.offset.0) / self.zoom,
            -(sy - center.1 - self.offset.1) / self.zoom,
        )
    }

    /// Zoom by `factor`, keeping the world point under `cursor` under the
    /// cursor. The new zoom is clamped before the offset math so the
    /// preserved point is computed against the zoom actually applied.
    fn zoom_around(&mut self, factor: f64, cursor: (f64, f64), center: (f64, f64), lo: f64, hi: f64) {
        let new_zoom = clamp(self.zoom * factor, lo, hi);
        let (wx, wy) = self.screen_to_world(cursor.0, cursor.1, center);
        self.zoom = new_zoom;
        let (sx, sy) = self.world_to_screen(wx, wy, center);
        self.offset.0 += cursor.0 - sx;
        self.offset.1 += cursor.1 - sy;
    }
}

// -------------------- Simulation state --------------------
struct SimState {
    sim_days: f64,
    time_scale: f64, // days per real second
    paused: bool,
    show_trails: bool,
    show_labels: bool,
}

impl SimState {
    fn new(cfg: &Config) -> Self {
        Self {
            sim_days: 0.0,
            time_scale: cfg.time_scale_init,
            paused: false,
            show_trails: cfg.show_trails,
            show_labels: cfg.show_labels,
        }
    }

    fn advance(&mut self, dt_sec: f64) {
        if !self.paused {
            self.sim_days += self.time_scale * dt_sec;
        }
    }
}

// -------------------- Bodies --------------------
struct Body {
    name: &'static str,
    color: Color,
    radius_cells: f64,
    orbit: Option<Orbit>, // None for the Sun
    trail: VecDeque<(i32, i32)>,
}

impl Body {
    fn position_au(&self, sim_days: f64) -> (f64, f64) {
        match &self.orbit {
            Some(orbit) => orbital_position_au(sim_days, orbit),
            None => (0.0, 0.0),
        }
    }

    fn push_trail(&mut self, p: (i32, i32), cap: usize) {
        while self.trail.len() >= cap {
            self.trail.pop_front();
        }
        self.trail.push_back(p);
    }
}

fn body_style(name: &str) -> (Color, f64) {
    match name {
        "Mercury" => (MERCURY_GRAY, 0.6),
        "Venus" => (ORANGE, 1.0),
        "Earth" => (BLUE, 1.0),
        "Mars" => (RED, 0.8),
        "Jupiter" => (ORANGE, 1.8),
        "Saturn" => (YELLOW, 1.6),
        "Uranus" => (CYAN, 1.4),
        "Neptune" => (PURPLE, 1.4),
        _ => (WHITE, 1.0),
    }
}

fn default_bodies() -> Vec<Body> {
    let mut bodies = vec![Body {
        name: "Sun",
        color: YELLOW,
        radius_cells: 2.4,
        orbit: None,
        trail: VecDeque::new(),
    }];
    for (name, orbit) in orbit_catalog() {
        let (color, radius_cells) = body_style(name);
        bodies.push(Body {
            name,
            color,
            radius_cells,
            orbit: Some(orbit),
            trail: VecDeque::new(),
        });
    }
    bodies
}

// -------------------- Cell buffer + diff render --------------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    fn blank(bg: Color) -> Self {
        Self { ch: ' ', fg: Color::Reset, bg }
    }
}

fn put_cell(buf: &mut [Cell], w: u16, h: u16, x: i32, y: i32, c: Cell) {
    if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
        return;
    }
    buf[(y as usize) * (w as usize) + x as usize] = c;
}

fn write_str(buf: &mut [Cell], w: u16, h: u16, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
    let mut xi = x;
    for ch in s.chars() {
        put_cell(buf, w, h, xi, y, Cell { ch, fg, bg });
        xi += 1;
    }
}

fn render_diff(out: &mut Stdout, w: u16, h: u16, prev: &mut [Cell], cur: &[Cell]) -> io::Result<()> {
    let mut cur_fg = Color::Reset;
    let mut cur_bg = Color::Reset;

    for y in 0..h as usize {
        for x in 0..w as usize {
            let i = y * (w as usize) + x;
            if prev[i] == cur[i] {
                continue;
            }
            prev[i] = cur[i];

            let c = cur[i];
            queue!(out, cursor::MoveTo(x as u16, y as u16))?;

            if c.bg != cur_bg {
                cur_bg = c.bg;
                queue!(out, SetBackgroundColor(cur_bg))?;
            }
            if c.fg != cur_fg {
                cur_fg = c.fg;
                queue!(out, SetForegroundColor(cur_fg))?;
            }
            queue!(out, Print(c.ch))?;
        }
    }
    Ok(())
}

// -------------------- Drawing primitives --------------------
fn fill_circle(buf: &mut [Cell], w: u16, h: u16, cx: f64, cy: f64, r: f64, color: Color) {
    let x0 = cx.round() as i32;
    let y0 = cy.round() as i32;
    if r < 0.75 {
        put_cell(buf, w, h, x0, y0, Cell { ch: '●', fg: color, bg: BACKGROUND });
        return;
    }
    let span = r.ceil() as i32;
    for dy in -span..=span {
        for dx in -span..=span {
            if ((dx * dx + dy * dy) as f64) <= r * r + 0.25 {
                put_cell(buf, w, h, x0 + dx, y0 + dy, Cell { ch: '█', fg: color, bg: BACKGROUND });
            }
        }
    }
}

fn draw_segment(buf: &mut [Cell], w: u16, h: u16, a: (i32, i32), b: (i32, i32), color: Color) {
    let dx = (b.0 - a.0) as f64;
    let dy = (b.1 - a.1) as f64;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = len.ceil().max(1.0) as i32;

    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (a.0 as f64 + dx * t).round() as i32;
        let y = (a.1 as f64 + dy * t).round() as i32;
        put_cell(buf, w, h, x, y, Cell { ch: '·', fg: color, bg: BACKGROUND });
    }
}

fn draw_polyline(buf: &mut [Cell], w: u16, h: u16, points: &VecDeque<(i32, i32)>, color: Color) {
    let mut prev: Option<(i32, i32)> = None;
    for &p in points {
        if let Some(a) = prev {
            draw_segment(buf, w, h, a, p, color);
        }
        prev = Some(p);
    }
}

// -------------------- HUD --------------------
fn draw_hud(buf: &mut [Cell], w: u16, h: u16, fps: f64, state: &SimState) {
    let lines = [
        format!("FPS: {:5.1}", fps),
        format!("Time Scale: {:.2} days/sec", state.time_scale),
        format!("Day: {:.1} ({:.2} yr)", state.sim_days, state.sim_days / DAYS_PER_YEAR),
        if state.paused { "Paused: YES".to_string() } else { "Paused: NO".to_string() },
        format!(
            "Labels: {} | Trails: {}",
            if state.show_labels { "ON" } else { "OFF" },
            if state.show_trails { "ON" } else { "OFF" }
        ),
        "Wheel=Zoom  RightDrag=Pan  +/-=Speed  Space=Pause  T=Trails  L=Labels  R=Reset  Esc=Quit"
            .to_string(),
    ];

    // gray drop shadow one cell down-right, then the text over it
    let mut y = 0;
    for text in &lines {
        write_str(buf, w, h, 2, y + 1, text, GRAY, BACKGROUND);
        write_str(buf, w, h, 1, y, text, WHITE, BACKGROUND);
        y += 1;
    }
}

// Back-buffer dimensions for a measured terminal size, floored for
// undersized terminals. The realloc guard compares against this, so it
// must return the same value every frame for the same input.
fn framebuffer_size(w: u16, h: u16) -> (u16, u16) {
    (w.max(40), h.max(12))
}

// -------------------- Main --------------------
fn main() -> Result<()> {
    validate_catalog(&orbit_catalog())?;

    let mut out = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, cursor::Hide, DisableLineWrap, EnableMouseCapture)?;
    let res = run(&mut out, Config::default());
    execute!(
        out,
        DisableMouseCapture,
        ResetColor,
        cursor::Show,
        EnableLineWrap,
        LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;
    res
}

fn run(out: &mut Stdout, cfg: Config) -> Result<()> {
    let mut bodies = default_bodies();
    let mut cam = Camera { zoom: cfg.zoom_init, offset: (0.0, 0.0) };
    let mut state = SimState::new(&cfg);

    // transient drag state
    let mut dragging = false;
    let mut drag_origin = (0i32, 0i32);
    let mut offset_origin = (0.0f64, 0.0f64);

    let mut prev_w: u16 = 0;
    let mut prev_h: u16 = 0;
    let mut prev_buf: Vec<Cell> = Vec::new();
    let mut cur_buf: Vec<Cell> = Vec::new();

    let mut last_frame = Instant::now();
    let frame_dt = Duration::from_millis(1000 / cfg.fps_cap.max(1));
    let mut fps = 0.0f64;

    loop {
        // input
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                    KeyCode::Esc => return Ok(()),
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    KeyCode::Char(' ') => state.paused = !state.paused,
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        state.time_scale =
                            clamp(state.time_scale * 1.2, cfg.time_scale_min, cfg.time_scale_max);
                    }
                    KeyCode::Char('-') | KeyCode::Char('_') => {
                        state.time_scale =
                            clamp(state.time_scale / 1.2, cfg.time_scale_min, cfg.time_scale_max);
                    }
                    KeyCode::Char('t') | KeyCode::Char('T') => {
                        state.show_trails = !state.show_trails;
                        if !state.show_trails {
                            for b in bodies.iter_mut() {
                                b.trail.clear();
                            }
                        }
                    }
                    KeyCode::Char('l') | KeyCode::Char('L') => state.show_labels = !state.show_labels,
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        cam.zoom = cfg.zoom_init;
                        cam.offset = (0.0, 0.0);
                    }
                    _ => {}
                },
                Event::Mouse(m) => {
                    let cursor_pos = (m.column as i32, m.row as i32);
                    match m.kind {
                        MouseEventKind::Down(MouseButton::Right) => {
                            dragging = true;
                            drag_origin = cursor_pos;
                            offset_origin = cam.offset;
                        }
                        MouseEventKind::Up(MouseButton::Right) => dragging = false,
                        MouseEventKind::Drag(MouseButton::Right) => {
                            if dragging {
                                cam.offset = (
                                    offset_origin.0 + (cursor_pos.0 - drag_origin.0) as f64,
                                    offset_origin.1 + (cursor_pos.1 - drag_origin.1) as f64,
                                );
                            }
                        }
                        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                            let factor = if m.kind == MouseEventKind::ScrollUp {
                                1.1
                            } else {
                                1.0 / 1.1
                            };
                            let center = ((prev_w as f64) * 0.5, (prev_h as f64) * 0.5);
                            cam.zoom_around(
                                factor,
                                (m.column as f64, m.row as f64),
                                center,
                                cfg.zoom_min,
                                cfg.zoom_max,
                            );
                        }
                        _ => {}
                    }
                }
                Event::Resize(..) => prev_w = 0,
                _ => {}
            }
        }

        // (re)alloc buffers on size change
        let (w, h) = terminal::size()?;
        let (w, h) = framebuffer_size(w, h);
        if w != prev_w || h != prev_h {
            prev_w = w;
            prev_h = h;
            prev_buf = vec![Cell::blank(BACKGROUND); (prev_w as usize) * (prev_h as usize)];
            cur_buf = vec![Cell::blank(BACKGROUND); (prev_w as usize) * (prev_h as usize)];
            execute!(out, terminal::Clear(ClearType::All))?;
        }

        let now = Instant::now();
        let dt = (now - last_frame).as_secs_f64().min(0.1);
        last_frame = now;
        if dt > 0.0 {
            fps = if fps == 0.0 { 1.0 / dt } else { fps * 0.9 + 0.1 / dt };
        }

        state.advance(dt);

        for c in cur_buf.iter_mut() {
            *c = Cell::blank(BACKGROUND);
        }

        let center = ((prev_w as f64) * 0.5, (prev_h as f64) * 0.5);

        for body in bodies.iter_mut() {
            let (wx, wy) = body.position_au(state.sim_days);
            let (sx, sy) = cam.world_to_screen(wx, wy, center);
            let sp = (sx.round() as i32, sy.round() as i32);

            if state.show_trails && body.orbit.is_some() {
                body.push_trail(sp, cfg.trail_cap);
                draw_polyline(&mut cur_buf, prev_w, prev_h, &body.trail, body.color);
            }

            fill_circle(&mut cur_buf, prev_w, prev_h, sx, sy, body.radius_cells, body.color);

            if state.show_labels {
                let lx = sp.0 - (body.name.len() as i32) / 2;
                let ly = sp.1 + body.radius_cells.ceil() as i32 + 1;
                write_str(&mut cur_buf, prev_w, prev_h, lx, ly, body.name, WHITE, BACKGROUND);
            }
        }

        draw_hud(&mut cur_buf, prev_w, prev_h, fps, &state);

        execute!(out, BeginSynchronizedUpdate)?;
        render_diff(out, prev_w, prev_h, &mut prev_buf, &cur_buf)?;
        execute!(out, EndSynchronizedUpdate)?;
        out.flush()?;

        // cap fps
        let elapsed = Instant::now() - now;
        if elapsed < frame_dt {
            std::thread::sleep(frame_dt - elapsed);
        }
    }
}

// -------------------- Tests --------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn earth() -> Orbit {
        Orbit { a_au: 1.0, period_years: 1.0, e: 0.0167, phi0: 0.0 }
    }

    #[test]
    fn clamp_basics() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn mean_anomaly_progresses_within_period() {
        let orbit = earth();
        let mut prev = mean_anomaly(0.0, &orbit);
        for i in 1..10 {
            let m = mean_anomaly(i as f64 * 0.1, &orbit);
            assert!(m >= prev, "anomaly regressed at step {i}: {m} < {prev}");
            prev = m;
        }
    }

    #[test]
    fn mean_anomaly_normalizes_negative_time() {
        let orbit = earth();
        let m = mean_anomaly(-0.3, &orbit);
        assert!((0.0..TAU).contains(&m), "got {m}");
    }

    #[test]
    fn elliptical_position_small_e_near_periapsis() {
        let (x, y) = elliptical_position(1.0, 0.01, 0.0);
        assert!((x - 0.99).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn earth_returns_near_start_after_one_year() {
        let orbit = Orbit { a_au: 1.0, period_years: 1.0, e: 0.0167, phi0: 0.3 };
        let (x0, y0) = orbital_position_au(0.0, &orbit);
        let (x1, y1) = orbital_position_au(DAYS_PER_YEAR, &orbit);
        assert!((x0 - x1).abs() < 0.05);
        assert!((y0 - y1).abs() < 0.05);
    }

    #[test]
    fn catalog_orbits_are_periodic() {
        for (name, orbit) in orbit_catalog() {
            let period_days = orbit.period_years * DAYS_PER_YEAR;
            let (x0, y0) = orbital_position_au(123.0, &orbit);
            let (x1, y1) = orbital_position_au(123.0 + period_days, &orbit);
            assert!((x0 - x1).abs() < 0.05, "{name}: x drift {}", (x0 - x1).abs());
            assert!((y0 - y1).abs() < 0.05, "{name}: y drift {}", (y0 - y1).abs());
        }
    }

    #[test]
    fn catalog_validates_and_stays_low_eccentricity() {
        let catalog = orbit_catalog();
        validate_catalog(&catalog).unwrap();
        for (name, orbit) in catalog {
            assert!(orbit.e < 0.25, "{name}: e = {} too high for the approximation", orbit.e);
        }
    }

    #[test]
    fn sun_stays_at_origin() {
        let sun = Body {
            name: "Sun",
            color: YELLOW,
            radius_cells: 2.4,
            orbit: None,
            trail: VecDeque::new(),
        };
        assert_eq!(sun.position_au(1234.5), (0.0, 0.0));
    }

    #[test]
    fn camera_round_trip() {
        let cam = Camera { zoom: 160.0, offset: (33.5, -12.25) };
        let center = (640.0, 400.0);
        let (sx, sy) = cam.world_to_screen(1.25, -3.5, center);
        let (wx, wy) = cam.screen_to_world(sx, sy, center);
        assert!((wx - 1.25).abs() < 1e-9);
        assert!((wy + 3.5).abs() < 1e-9);
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut cam = Camera { zoom: 12.0, offset: (5.0, -3.0) };
        let center = (60.0, 20.0);
        let cursor = (100.0, 30.0);
        let (wx, wy) = cam.screen_to_world(cursor.0, cursor.1, center);

        cam.zoom_around(1.1, cursor, center, 0.8, 240.0);

        let (sx, sy) = cam.world_to_screen(wx, wy, center);
        assert!((sx - cursor.0).abs() < 1.0);
        assert!((sy - cursor.1).abs() < 1.0);
    }

    #[test]
    fn zoom_clamps_at_bounds_without_drifting_offset() {
        let mut cam = Camera { zoom: 240.0, offset: (7.0, 11.0) };
        let center = (60.0, 20.0);

        cam.zoom_around(1.1, (10.0, 10.0), center, 0.8, 240.0);

        assert_eq!(cam.zoom, 240.0);
        assert!((cam.offset.0 - 7.0).abs() < 1e-9);
        assert!((cam.offset.1 - 11.0).abs() < 1e-9);
    }

    #[test]
    fn trail_capacity_evicts_oldest() {
        let mut body = Body {
            name: "Earth",
            color: BLUE,
            radius_cells: 1.0,
            orbit: Some(earth()),
            trail: VecDeque::new(),
        };
        let cap = 600;
        for i in 0..(cap + 5) {
            body.push_trail((i as i32, 0), cap);
        }
        assert_eq!(body.trail.len(), cap);
        assert_eq!(body.trail.front(), Some(&(5, 0)));
        assert_eq!(body.trail.back(), Some(&((cap + 4) as i32, 0)));
    }

    #[test]
    fn paused_clock_does_not_advance() {
        let cfg = Config::default();
        let mut state = SimState::new(&cfg);
        state.paused = true;
        state.advance(1.0);
        assert_eq!(state.sim_days, 0.0);
    }

    #[test]
    fn running_clock_advances_by_time_scale() {
        let cfg = Config::default();
        let mut state = SimState::new(&cfg);
        state.time_scale = 20.0;
        state.advance(0.5);
        assert!((state.sim_days - 10.0).abs() < 1e-12);
    }

    #[test]
    fn hud_text_carries_drop_shadow() {
        let cfg = Config::default();
        let state = SimState::new(&cfg);
        let (w, h) = (120u16, 30u16);
        let mut buf = vec![Cell::blank(BACKGROUND); (w as usize) * (h as usize)];

        draw_hud(&mut buf, w, h, 60.0, &state);

        // first line starts white at (1,0)
        let top = buf[1];
        assert_eq!(top.ch, 'F');
        assert_eq!(top.fg, WHITE);
        // the last line has no line below it, so its shadow is intact:
        // controls text at (1,5), gray copy at (2,6)
        let shadow = buf[6 * w as usize + 2];
        assert_eq!(shadow.ch, 'W');
        assert_eq!(shadow.fg, GRAY);
        // a shadow cell that collides with the next line is overwritten
        // by that line's text
        let collided = buf[w as usize + 2]; // (2, 1)
        assert_eq!(collided.fg, WHITE);
    }

    #[test]
    fn framebuffer_size_is_stable_below_the_floor() {
        assert_eq!(framebuffer_size(20, 6), (40, 12));
        // feeding the floored size back yields the same answer, so the
        // realloc guard settles instead of clearing every frame
        let (w, h) = framebuffer_size(20, 6);
        assert_eq!(framebuffer_size(w, h), (w, h));
        assert_eq!(framebuffer_size(120, 30), (120, 30));
    }

    #[test]
    fn time_scale_steps_stay_in_bounds() {
        let cfg = Config::default();
        let mut ts = cfg.time_scale_max;
        ts = clamp(ts * 1.2, cfg.time_scale_min, cfg.time_scale_max);
        assert_eq!(ts, cfg.time_scale_max);
        ts = cfg.time_scale_min;
        ts = clamp(ts / 1.2, cfg.time_scale_min, cfg.time_scale_max);
        assert_eq!(ts, cfg.time_scale_min);
    }
}
