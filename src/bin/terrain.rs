use render_assignments::{
    config::AppConfig,
    flow,
    flows::{
        ModelSettings, SkyboxSettings, TerrainSettings, model::model, skybox::skybox,
        terrain::terrain,
    },
};

fn main() {
    // The skybox has to come first, everything else is drawn over it.
    let flows = vec![
        skybox(SkyboxSettings::default()),
        terrain(TerrainSettings::default()),
        model(ModelSettings::terrain_scene()),
    ];
    if let Err(e) = flow::run(AppConfig::terrain(), flows) {
        log::error!("{e:#}");
        std::process::exit(-1);
    }
}
