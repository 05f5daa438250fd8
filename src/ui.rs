// 🖥️ Dashboard UI - Four Views Over the Filtered Table
// Distribution, map, categories, detail table; filter sidebar always visible

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Map, MapResolution},
        Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;

use crate::charts::{category_counts, map_points, AmountHistogram, CategoryCount, MapPoint};
use crate::dataset::{Dataset, Estado, Transaction, DETAIL_COLUMNS};
use crate::filter::{FilterRow, FilterState};
use crate::geo::CityRegistry;
use crate::metrics::DashboardMetrics;

// Brand palette: green for valid, red for fraudulent
const COLOR_VALIDA: Color = Color::Rgb(0x2e, 0xcc, 0x71);
const COLOR_FRAUDE: Color = Color::Rgb(0xe7, 0x4c, 0x3c);

const FILTER_PANEL_WIDTH: u16 = 34;
const TABLE_PAGE_STEP: usize = 20;

// ============================================================================
// PAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Distribucion,
    Mapa,
    Categorias,
    Datos,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Distribucion => Page::Mapa,
            Page::Mapa => Page::Categorias,
            Page::Categorias => Page::Datos,
            Page::Datos => Page::Distribucion,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Distribucion => Page::Datos,
            Page::Mapa => Page::Distribucion,
            Page::Categorias => Page::Mapa,
            Page::Datos => Page::Categorias,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Distribucion => "Distribución por Monto",
            Page::Mapa => "Mapa de Transacciones",
            Page::Categorias => "Análisis por Categoría",
            Page::Datos => "Datos Detallados",
        }
    }
}

/// Which half of the screen the arrow keys drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Filters,
    Content,
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub dataset: Arc<Dataset>,
    pub registry: CityRegistry,
    pub filter: FilterState,

    // Derived from dataset + filter, refreshed by recompute()
    pub filtered: Vec<Transaction>,
    pub metrics: DashboardMetrics,
    pub histogram: AmountHistogram,
    pub categorias: Vec<CategoryCount>,
    pub puntos: Vec<MapPoint>,

    pub current_page: Page,
    pub focus: Focus,
    pub filter_rows: Vec<FilterRow>,
    pub filter_cursor: usize,
    pub table_state: TableState,
    pub show_detail: bool,

    /// High-resolution world outline when a map token is configured
    pub detailed_map: bool,

    pub date_bounds: (NaiveDate, NaiveDate),
    pub amount_bounds: (f64, f64),
    pub amount_step: f64,
}

impl App {
    pub fn new(dataset: Arc<Dataset>, registry: CityRegistry, detailed_map: bool) -> Self {
        let filter = FilterState::spanning(&dataset);
        let filter_rows = FilterRow::build(&dataset);

        let date_bounds = (filter.fecha_desde, filter.fecha_hasta);
        let amount_bounds = (filter.monto_min, filter.monto_max);
        // One nudge moves an amount bound by 2% of the full span
        let span = amount_bounds.1 - amount_bounds.0;
        let amount_step = if span > 0.0 { (span / 50.0).max(0.01) } else { 1.0 };

        let mut app = App {
            dataset,
            registry,
            filter,
            filtered: Vec::new(),
            metrics: DashboardMetrics::compute(&[]),
            histogram: AmountHistogram::build(&[]),
            categorias: Vec::new(),
            puntos: Vec::new(),
            current_page: Page::Distribucion,
            focus: Focus::Filters,
            filter_rows,
            filter_cursor: 0,
            table_state: TableState::default(),
            show_detail: false,
            detailed_map,
            date_bounds,
            amount_bounds,
            amount_step,
        };
        app.recompute();
        app
    }

    /// Re-derive every view model after a filter change
    pub fn recompute(&mut self) {
        self.filtered = self.filter.apply(&self.dataset);
        self.metrics = DashboardMetrics::compute(&self.filtered);
        self.histogram = AmountHistogram::build(&self.filtered);
        self.categorias = category_counts(&self.filtered);
        self.puntos = map_points(&self.filtered, &self.registry);

        if self.filtered.is_empty() {
            self.table_state.select(None);
        } else {
            let selected = self.table_state.selected().unwrap_or(0);
            self.table_state
                .select(Some(selected.min(self.filtered.len() - 1)));
        }
    }

    pub fn filters_active(&self) -> bool {
        self.filter != FilterState::spanning(&self.dataset)
    }

    // ---- page navigation ----

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn goto_page(&mut self, page: Page) {
        self.current_page = page;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Filters => Focus::Content,
            Focus::Content => Focus::Filters,
        };
    }

    pub fn toggle_detail(&mut self) {
        if self.current_page == Page::Datos {
            self.show_detail = !self.show_detail;
        }
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.table_state
            .selected()
            .and_then(|i| self.filtered.get(i))
    }

    // ---- filter cursor ----

    pub fn filter_down(&mut self) {
        if self.filter_rows.is_empty() {
            return;
        }
        self.filter_cursor = (self.filter_cursor + 1) % self.filter_rows.len();
    }

    pub fn filter_up(&mut self) {
        if self.filter_rows.is_empty() {
            return;
        }
        if self.filter_cursor == 0 {
            self.filter_cursor = self.filter_rows.len() - 1;
        } else {
            self.filter_cursor -= 1;
        }
    }

    /// Left/right adjustment of the focused criterion. Windows clamp against
    /// their partner edge and the dataset bounds.
    pub fn adjust(&mut self, forward: bool) {
        let Some(row) = self.filter_rows.get(self.filter_cursor).cloned() else {
            return;
        };

        match row {
            FilterRow::FechaDesde => {
                let nudged = nudge_date(self.filter.fecha_desde, forward);
                if let Some(date) = nudged {
                    self.filter.fecha_desde =
                        clamp_date(date, self.date_bounds.0, self.filter.fecha_hasta);
                }
            }
            FilterRow::FechaHasta => {
                let nudged = nudge_date(self.filter.fecha_hasta, forward);
                if let Some(date) = nudged {
                    self.filter.fecha_hasta =
                        clamp_date(date, self.filter.fecha_desde, self.date_bounds.1);
                }
            }
            FilterRow::MontoMin => {
                let step = if forward { self.amount_step } else { -self.amount_step };
                self.filter.monto_min = (self.filter.monto_min + step)
                    .clamp(self.amount_bounds.0, self.filter.monto_max);
            }
            FilterRow::MontoMax => {
                let step = if forward { self.amount_step } else { -self.amount_step };
                self.filter.monto_max = (self.filter.monto_max + step)
                    .clamp(self.filter.monto_min, self.amount_bounds.1);
            }
            FilterRow::Estado => {
                self.filter.estado = if forward {
                    self.filter.estado.next()
                } else {
                    self.filter.estado.previous()
                };
            }
            FilterRow::Metodo(_) | FilterRow::Categoria(_) => return,
        }

        self.recompute();
    }

    /// Space: toggle membership on a set row, cycle estado on its row
    pub fn toggle_current(&mut self) {
        let Some(row) = self.filter_rows.get(self.filter_cursor).cloned() else {
            return;
        };

        match row {
            FilterRow::Metodo(name) => {
                if !self.filter.metodos_pago.remove(&name) {
                    self.filter.metodos_pago.insert(name);
                }
            }
            FilterRow::Categoria(name) => {
                if !self.filter.categorias.remove(&name) {
                    self.filter.categorias.insert(name);
                }
            }
            FilterRow::Estado => {
                self.filter.estado = self.filter.estado.next();
            }
            _ => return,
        }

        self.recompute();
    }

    /// Select every entry of the set group under the cursor
    pub fn select_all_group(&mut self) {
        match self.filter_rows.get(self.filter_cursor) {
            Some(FilterRow::Metodo(_)) => {
                self.filter.metodos_pago = self.dataset.payment_methods().into_iter().collect();
            }
            Some(FilterRow::Categoria(_)) => {
                self.filter.categorias = self.dataset.product_categories().into_iter().collect();
            }
            _ => return,
        }
        self.recompute();
    }

    pub fn reset_filters(&mut self) {
        self.filter.reset(&self.dataset);
        self.recompute();
    }

    // ---- table navigation ----

    pub fn next_row(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => (i + TABLE_PAGE_STEP).min(len - 1),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.table_state.selected() {
            Some(i) => i.saturating_sub(TABLE_PAGE_STEP),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    // ---- key dispatch ----

    /// One key press against the current state. Returns true when the
    /// session should end.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.show_detail {
                    self.show_detail = false;
                } else {
                    return true;
                }
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Char('1') => self.goto_page(Page::Distribucion),
            KeyCode::Char('2') => self.goto_page(Page::Mapa),
            KeyCode::Char('3') => self.goto_page(Page::Categorias),
            KeyCode::Char('4') => self.goto_page(Page::Datos),
            KeyCode::Char('f') => self.toggle_focus(),
            KeyCode::Char('c') => self.reset_filters(),
            KeyCode::Char('a') if self.focus == Focus::Filters => self.select_all_group(),
            KeyCode::Char(' ') if self.focus == Focus::Filters => self.toggle_current(),
            KeyCode::Enter => match self.focus {
                Focus::Filters => self.toggle_current(),
                Focus::Content => self.toggle_detail(),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Filters => self.filter_down(),
                Focus::Content => self.next_row(),
            },
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Filters => self.filter_up(),
                Focus::Content => self.previous_row(),
            },
            KeyCode::Left | KeyCode::Char('h') => {
                if self.focus == Focus::Filters {
                    self.adjust(false);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.focus == Focus::Filters {
                    self.adjust(true);
                }
            }
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if !self.filtered.is_empty() {
                    self.table_state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.filtered.is_empty() {
                    self.table_state.select(Some(self.filtered.len() - 1));
                }
            }
            _ => {}
        }
        false
    }
}

fn nudge_date(date: NaiveDate, forward: bool) -> Option<NaiveDate> {
    if forward {
        date.succ_opt()
    } else {
        date.pred_opt()
    }
}

fn clamp_date(date: NaiveDate, lower: NaiveDate, upper: NaiveDate) -> NaiveDate {
    date.max(lower).min(upper)
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if app.on_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with view tabs
            Constraint::Length(3), // Metrics strip
            Constraint::Min(0),    // Filter sidebar + active view
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_metrics(f, chunks[1], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(FILTER_PANEL_WIDTH), Constraint::Min(0)])
        .split(chunks[2]);

    render_filters(f, body[0], app);

    if app.filtered.is_empty() {
        render_empty_notice(f, body[1], app);
    } else if app.current_page == Page::Datos && app.show_detail {
        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(body[1]);

        render_datos(f, content[0], app);
        render_detail_panel(f, content[1], app);
    } else {
        match app.current_page {
            Page::Distribucion => render_distribucion(f, body[1], app),
            Page::Mapa => render_mapa(f, body[1], app),
            Page::Categorias => render_categorias(f, body[1], app),
            Page::Datos => render_datos(f, body[1], app),
        }
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [
        (Page::Distribucion, "1 Distribución"),
        (Page::Mapa, "2 Mapa"),
        (Page::Categorias, "3 Categorías"),
        (Page::Datos, "4 Datos"),
    ];

    let mut tab_spans = vec![];
    for (i, (page, name)) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(*name, style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.current_page.title(),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 📊 Dashboard de Análisis de Transacciones Reales "),
    );

    f.render_widget(header, area);
}

fn render_metrics(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let fraud_color = if app.metrics.fraudulentas > 0 {
        COLOR_FRAUDE
    } else {
        COLOR_VALIDA
    };

    let cards = [
        ("Total Transacciones", app.metrics.total_label(), Color::White),
        ("Transacciones Fraudulentas", app.metrics.fraude_label(), fraud_color),
        ("Monto Promedio", app.metrics.monto_promedio_label(), Color::Cyan),
        ("Edad Promedio Cliente", app.metrics.edad_promedio_label(), Color::Cyan),
    ];

    for (i, (title, value, color)) in cards.iter().enumerate() {
        let card = Paragraph::new(Line::from(Span::styled(
            format!(" {}", value),
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        );
        f.render_widget(card, chunks[i]);
    }
}

// ============================================================================
// FILTER SIDEBAR
// ============================================================================

fn render_filters(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Filters;
    let mut lines = vec![];
    let mut row_index = 0usize;

    let section = |text: &str| {
        Line::from(Span::styled(
            format!(" {}", text),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
    };

    lines.push(section("Rango de fechas"));
    for row in &app.filter_rows {
        match row {
            FilterRow::FechaDesde => lines.push(filter_line(
                format!("Desde: {}", app.filter.fecha_desde),
                focused && row_index == app.filter_cursor,
            )),
            FilterRow::FechaHasta => lines.push(filter_line(
                format!("Hasta: {}", app.filter.fecha_hasta),
                focused && row_index == app.filter_cursor,
            )),
            FilterRow::MontoMin => {
                lines.push(Line::from(""));
                lines.push(section("Rango de montos (USD)"));
                lines.push(filter_line(
                    format!("Mín: ${:.2}", app.filter.monto_min),
                    focused && row_index == app.filter_cursor,
                ));
            }
            FilterRow::MontoMax => lines.push(filter_line(
                format!("Máx: ${:.2}", app.filter.monto_max),
                focused && row_index == app.filter_cursor,
            )),
            FilterRow::Metodo(name) => {
                if matches!(app.filter_rows.get(row_index.wrapping_sub(1)), Some(FilterRow::MontoMax)) {
                    lines.push(Line::from(""));
                    lines.push(section("Método de pago"));
                }
                let marked = app.filter.metodos_pago.contains(name);
                lines.push(checkbox_line(
                    name,
                    marked,
                    focused && row_index == app.filter_cursor,
                ));
            }
            FilterRow::Categoria(name) => {
                if matches!(app.filter_rows.get(row_index.wrapping_sub(1)), Some(FilterRow::Metodo(_))) {
                    lines.push(Line::from(""));
                    lines.push(section("Categoría de Producto"));
                }
                let marked = app.filter.categorias.contains(name);
                lines.push(checkbox_line(
                    name,
                    marked,
                    focused && row_index == app.filter_cursor,
                ));
            }
            FilterRow::Estado => {
                lines.push(Line::from(""));
                lines.push(section("Estado de transacción"));
                lines.push(filter_line(
                    format!("Estado: {}", app.filter.estado.label()),
                    focused && row_index == app.filter_cursor,
                ));
            }
        }
        row_index += 1;
    }

    lines.push(Line::from(""));
    lines.push(section("Notas:"));
    lines.push(Line::from(Span::styled(
        "  Utiliza los filtros para explorar",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        "  los datos en detalle.",
        Style::default().fg(Color::DarkGray),
    )));

    let border_color = if focused { Color::Yellow } else { Color::White };
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Filtros de Transacciones "),
    );

    f.render_widget(panel, area);
}

fn filter_line(text: String, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let marker = if selected { "→ " } else { "  " };
    Line::from(Span::styled(format!(" {}{}", marker, text), style))
}

fn checkbox_line(name: &str, marked: bool, selected: bool) -> Line<'static> {
    let box_mark = if marked { "[x]" } else { "[ ]" };
    let mut style = if marked {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    if selected {
        style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
    }
    let marker = if selected { "→ " } else { "  " };
    Line::from(Span::styled(
        format!(" {}{} {}", marker, box_mark, truncate(name, 22)),
        style,
    ))
}

// ============================================================================
// VIEW: AMOUNT DISTRIBUTION
// ============================================================================

fn render_distribucion(f: &mut Frame, area: Rect, app: &App) {
    let max_total = app.histogram.max_bin_total();
    let label_width = 16usize;
    let counts_width = 14usize;
    let avail = (area.width as usize)
        .saturating_sub(2 + label_width + counts_width)
        .max(1);

    let mut lines = vec![Line::from(vec![
        Span::raw(" "),
        Span::styled("■ Válidas", Style::default().fg(COLOR_VALIDA)),
        Span::raw("  "),
        Span::styled("■ Fraudulentas", Style::default().fg(COLOR_FRAUDE)),
    ])];

    for bin in &app.histogram.bins {
        let (valid_cells, fraud_cells) =
            bar_segments(bin.validas, bin.fraudulentas, max_total, avail);

        lines.push(Line::from(vec![
            Span::styled(
                format!("{:>width$} ", bin.range_label(), width = label_width - 1),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                symbols::block::FULL.repeat(valid_cells),
                Style::default().fg(COLOR_VALIDA),
            ),
            Span::styled(
                symbols::block::FULL.repeat(fraud_cells),
                Style::default().fg(COLOR_FRAUDE),
            ),
            Span::styled(
                format!(" {} / {}", bin.validas, bin.fraudulentas),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let chart = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Distribución de Transacciones por Monto "),
    );

    f.render_widget(chart, area);
}

/// Both segments of a stacked bar share one scale, so equal counts are
/// equal width in every bin. The wider segment absorbs any rounding
/// overflow past the row.
fn bar_segments(validas: u64, fraudulentas: u64, max: u64, avail: usize) -> (usize, usize) {
    let mut valid_cells = scaled_cells(validas, max, avail);
    let mut fraud_cells = scaled_cells(fraudulentas, max, avail);

    let overflow = (valid_cells + fraud_cells).saturating_sub(avail);
    if valid_cells >= fraud_cells {
        valid_cells = valid_cells.saturating_sub(overflow);
    } else {
        fraud_cells = fraud_cells.saturating_sub(overflow);
    }
    (valid_cells, fraud_cells)
}

fn scaled_cells(count: u64, max: u64, avail: usize) -> usize {
    if count == 0 || max == 0 || avail == 0 {
        return 0;
    }
    let cells = (count as f64 / max as f64 * avail as f64).round() as usize;
    cells.clamp(1, avail)
}

// ============================================================================
// VIEW: LOCATION MAP
// ============================================================================

fn render_mapa(f: &mut Frame, area: Rect, app: &App) {
    if app.puntos.is_empty() {
        let notice = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No hay datos de ubicación válidos para mostrar",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(Span::styled(
                "  en el mapa con los filtros seleccionados.",
                Style::default().fg(Color::Yellow),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Mapa de Transacciones "),
        );
        f.render_widget(notice, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let resolution = if app.detailed_map {
        MapResolution::High
    } else {
        MapResolution::Low
    };
    let max_fraud = app.puntos.iter().map(|p| p.fraudulentas).max().unwrap_or(0);
    let max_total = app.puntos.iter().map(|p| p.total()).max().unwrap_or(0);

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Mapa de Transacciones por Ubicación "),
        )
        .x_bounds([-180.0, 180.0])
        .y_bounds([-90.0, 90.0])
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution,
                color: Color::DarkGray,
            });

            for punto in &app.puntos {
                let radius = 1.0 + (punto.total() as f64).sqrt().min(6.0);
                let color = marker_color(punto, max_fraud, max_total);

                ctx.draw(&Circle {
                    x: punto.lon,
                    y: punto.lat,
                    radius,
                    color,
                });
            }

            // Label only the busiest cities; more would clutter the canvas
            for punto in app.puntos.iter().take(5) {
                ctx.print(
                    punto.lon,
                    punto.lat,
                    Line::from(Span::styled(
                        punto.ciudad.clone(),
                        Style::default().fg(Color::White),
                    )),
                );
            }
        });

    f.render_widget(canvas, chunks[0]);
    render_city_table(f, chunks[1], app);
}

/// Colorscale stand-in: a city's fraud count against the worst city's
/// decides its color. With no fraud anywhere in the subset, shade by volume.
fn marker_color(punto: &MapPoint, max_fraud: u64, max_total: u64) -> Color {
    if max_fraud > 0 {
        if punto.fraudulentas == 0 {
            COLOR_VALIDA
        } else if punto.fraudulentas * 2 < max_fraud {
            Color::Yellow
        } else {
            COLOR_FRAUDE
        }
    } else {
        let share = if max_total == 0 {
            0.0
        } else {
            punto.total() as f64 / max_total as f64
        };
        if share < 0.34 {
            Color::Cyan
        } else if share < 0.67 {
            Color::LightBlue
        } else {
            Color::Blue
        }
    }
}

fn render_city_table(f: &mut Frame, area: Rect, app: &App) {
    let max_fraud = app.puntos.iter().map(|p| p.fraudulentas).max().unwrap_or(0);
    let max_total = app.puntos.iter().map(|p| p.total()).max().unwrap_or(0);

    let header_cells = ["Ciudad", "Válidas", "Fraudes", "Total"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.puntos.iter().map(|punto| {
        let color = marker_color(punto, max_fraud, max_total);
        let cells = vec![
            Cell::from(truncate(&punto.ciudad, 14)),
            Cell::from(format!("{}", punto.validas)),
            Cell::from(format!("{}", punto.fraudulentas)).style(Style::default().fg(color)),
            Cell::from(format!("{}", punto.total())),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(15),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Ciudades "),
    );

    f.render_widget(table, area);
}

// ============================================================================
// VIEW: PRODUCT CATEGORIES
// ============================================================================

fn render_categorias(f: &mut Frame, area: Rect, app: &App) {
    let max_total = app
        .categorias
        .iter()
        .map(|c| c.validas.max(c.fraudulentas))
        .max()
        .unwrap_or(0);

    let mut chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Transacciones por Categoría de Producto y Estado "),
        )
        .bar_width(7)
        .bar_gap(1)
        .group_gap(3)
        .max(max_total);

    for count in &app.categorias {
        let bars = [
            Bar::default()
                .value(count.validas)
                .style(Style::default().fg(COLOR_VALIDA)),
            Bar::default()
                .value(count.fraudulentas)
                .style(Style::default().fg(COLOR_FRAUDE)),
        ];
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(truncate(&count.categoria, 15)))
                .bars(&bars),
        );
    }

    f.render_widget(chart, area);
}

// ============================================================================
// VIEW: DETAIL TABLE
// ============================================================================

fn render_datos(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = DETAIL_COLUMNS.iter().map(|(_, display)| {
        Cell::from(*display).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered.iter().map(|tx| {
        let estado_color = match tx.estado {
            Estado::Valida => COLOR_VALIDA,
            Estado::Fraudulenta => COLOR_FRAUDE,
        };

        let cells = DETAIL_COLUMNS.iter().map(move |(canonical, _)| {
            let width = datos_column_width(canonical) as usize;
            let cell = Cell::from(truncate(&tx.display_value(canonical), width));
            match *canonical {
                "monto" | "es_fraudulenta" | "estado" => {
                    cell.style(Style::default().fg(estado_color))
                }
                _ => cell,
            }
        });

        Row::new(cells).height(1)
    });

    let widths: Vec<Constraint> = DETAIL_COLUMNS
        .iter()
        .map(|(canonical, _)| Constraint::Length(datos_column_width(canonical)))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Datos Detallados ({} filas) ", app.filtered.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

/// Column widths for the detail table; narrow terminals clip from the right
fn datos_column_width(canonical: &str) -> u16 {
    match canonical {
        "transaction_id" => 14,
        "fecha" => 17,
        "monto" => 11,
        "metodo_pago" => 15,
        "ubicacion" => 17,
        "categoria_producto" => 19,
        "cantidad" => 9,
        "edad_cliente" => 13,
        "dispositivo_usado" => 12,
        "es_fraudulenta" => 20,
        _ => 12,
    }
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let tx = match app.selected_transaction() {
        Some(tx) => tx,
        None => {
            let no_selection = Paragraph::new("Ninguna transacción seleccionada").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Detalle de Transacción "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let estado_color = match tx.estado {
        Estado::Valida => COLOR_VALIDA,
        Estado::Fraudulenta => COLOR_FRAUDE,
    };

    let label = |text: &str| {
        Span::styled(
            format!("  {}: ", text),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![label("ID Transacción"), Span::raw(tx.transaction_id.clone())]),
        Line::from(vec![label("ID Cliente"), Span::raw(tx.customer_id.clone())]),
        Line::from(""),
        Line::from(vec![
            label("Monto"),
            Span::styled(format!("${:.2}", tx.monto), Style::default().fg(estado_color)),
        ]),
        Line::from(vec![
            label("Fecha"),
            Span::raw(tx.fecha.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]),
        Line::from(vec![
            label("Estado"),
            Span::styled(
                tx.estado.label(),
                Style::default().fg(estado_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![label("Método de Pago"), Span::raw(tx.metodo_pago.clone())]),
        Line::from(vec![
            label("Categoría"),
            Span::raw(tx.categoria_producto.clone()),
        ]),
        Line::from(vec![label("Cantidad"), Span::raw(tx.cantidad.to_string())]),
        Line::from(vec![
            label("Hora de Transacción"),
            Span::raw(format!("{}:00", tx.hora_transaccion)),
        ]),
        Line::from(""),
        Line::from(vec![label("Edad del Cliente"), Span::raw(tx.edad_cliente.to_string())]),
        Line::from(vec![
            label("Antigüedad de Cuenta"),
            Span::raw(format!("{} días", tx.antiguedad_cuenta_dias)),
        ]),
        Line::from(vec![label("Ubicación"), Span::raw(tx.ubicacion.clone())]),
        Line::from(vec![
            label("Dispositivo"),
            Span::raw(tx.dispositivo_usado.clone()),
        ]),
        Line::from(vec![label("Dirección IP"), Span::raw(tx.ip_address.clone())]),
        Line::from(""),
        Line::from(vec![
            label("Envío"),
            Span::styled(
                truncate(&tx.direccion_envio, 30),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            label("Facturación"),
            Span::styled(
                truncate(&tx.direccion_facturacion, 30),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Esc para cerrar",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Detalle de Transacción "),
    );

    f.render_widget(panel, area);
}

// ============================================================================
// SHARED CHROME
// ============================================================================

fn render_empty_notice(f: &mut Frame, area: Rect, app: &App) {
    let text = if app.dataset.is_empty() {
        "  No se pudieron cargar los datos."
    } else {
        "  No hay transacciones que coincidan con los filtros seleccionados."
    };

    let notice = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Pulsa 'c' para restablecer los filtros.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" {} ", app.current_page.title())),
    );

    f.render_widget(notice, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.table_state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered.len();

    let mut status_spans = vec![Span::styled(
        format!(" Filas: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.filters_active() {
        status_spans.push(Span::raw("| "));
        status_spans.push(Span::styled(
            "Filtros activos",
            Style::default().fg(COLOR_VALIDA),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" limpiar) "));
    }

    status_spans.push(Span::raw("| "));
    status_spans.push(Span::styled("f", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Foco | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Vista | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Mover | "));
    status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Ajustar | "));
    status_spans.push(Span::styled("Espacio", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Marcar | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Detalle | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Salir"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

// ============================================================================
// TESTS
// ============================================================================
