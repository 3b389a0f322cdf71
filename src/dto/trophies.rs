use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    engine::model::{RawTrophyGroup, Trophy},
    upstream::psn::TitleDetail,
};

/// Optional display hints echoed back in the detail `meta` block.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DetailQuery {
    pub game_name: Option<String>,
    pub platform: Option<String>,
}

/// Which title a detail response describes.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailMeta {
    pub np_communication_id: String,
    pub game_name: Option<String>,
    pub platform: Option<String>,
}

/// Merged trophy list and group metadata for one title.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetailResponse {
    pub meta: DetailMeta,
    pub trophies: Vec<Trophy>,
    pub groups: Vec<RawTrophyGroup>,
}

impl TitleDetailResponse {
    pub fn new(np_communication_id: &str, query: DetailQuery, detail: TitleDetail) -> Self {
        Self {
            meta: DetailMeta {
                np_communication_id: np_communication_id.to_string(),
                game_name: query.game_name,
                platform: query.platform,
            },
            trophies: detail.trophies,
            groups: detail.groups,
        }
    }
}
