use render_assignments::{
    config::AppConfig,
    flow,
    flows::{BoxSettings, rotating_box::rotating_box},
};

fn main() {
    if let Err(e) = flow::run(AppConfig::rotating_box(), vec![rotating_box(BoxSettings::default())]) {
        log::error!("{e:#}");
        std::process::exit(-1);
    }
}
