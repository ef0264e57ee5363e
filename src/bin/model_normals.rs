use render_assignments::{
    config::AppConfig,
    flow,
    flows::{ModelSettings, model::model},
};

fn main() {
    if let Err(e) = flow::run(AppConfig::model_normals(), vec![model(ModelSettings::normals_scene())]) {
        log::error!("{e:#}");
        std::process::exit(-1);
    }
}
