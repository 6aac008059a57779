use std::time::Duration;

use google_drive3::common::GetToken;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{FormDefinition, FormItem, FormMetadata, FormQuestion, Grading, ProviderError};
use crate::workflows::assessment::domain::FormId;

pub const DEFAULT_FORMS_API_BASE_URL: &str = "https://forms.googleapis.com/v1";
const FORMS_SCOPES: &[&str] = &["https://www.googleapis.com/auth/forms.body.readonly"];

/// Minimal Google Forms REST client: `forms.get` for metadata and the full
/// item list. Tokens come from the same authenticator the Drive hub uses.
#[derive(Clone)]
pub struct FormsApiClient {
    http: Client,
    base_url: String,
    auth: Box<dyn GetToken>,
}

impl FormsApiClient {
    pub fn new(
        base_url: impl Into<String>,
        auth: Box<dyn GetToken>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ProviderError::Transport(format!("http client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, fields: &str) -> Result<T, ProviderError> {
        let token = self
            .auth
            .get_token(FORMS_SCOPES)
            .await
            .map_err(|err| ProviderError::Auth(err.to_string()))?
            .ok_or_else(|| ProviderError::Auth("authenticator returned no token".to_string()))?;

        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(&[("fields", fields)])
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))
    }

    pub async fn metadata(&self, form_id: &str) -> Result<FormMetadata, ProviderError> {
        let form: WireForm = self
            .get(&format!("/forms/{form_id}"), "formId,responderUri")
            .await?;
        form.into_metadata()
    }

    pub async fn form_definition(&self, form_id: &FormId) -> Result<FormDefinition, ProviderError> {
        let form: WireForm = self
            .get(
                &format!("/forms/{form_id}"),
                "formId,items(itemId,questionItem(question(questionId,grading)))",
            )
            .await?;
        Ok(form.into_definition())
    }
}

impl std::fmt::Debug for FormsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormsApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireForm {
    form_id: Option<String>,
    responder_uri: Option<String>,
    #[serde(default)]
    items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    item_id: Option<String>,
    question_item: Option<WireQuestionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestionItem {
    question: Option<WireQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    question_id: Option<String>,
    grading: Option<WireGrading>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGrading {
    #[serde(default)]
    point_value: i64,
    correct_answers: Option<WireCorrectAnswers>,
}

#[derive(Debug, Deserialize)]
struct WireCorrectAnswers {
    #[serde(default)]
    answers: Vec<WireAnswer>,
}

#[derive(Debug, Deserialize)]
struct WireAnswer {
    value: Option<String>,
}

impl WireForm {
    fn into_metadata(self) -> Result<FormMetadata, ProviderError> {
        match (self.form_id, self.responder_uri) {
            (Some(form_id), Some(responder_uri)) => Ok(FormMetadata {
                form_id: FormId(form_id),
                responder_uri,
            }),
            _ => Err(ProviderError::Decode(
                "form metadata is missing formId or responderUri".to_string(),
            )),
        }
    }

    fn into_definition(self) -> FormDefinition {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let item_id = item.item_id.unwrap_or_default();
                let question = item
                    .question_item
                    .and_then(|question_item| question_item.question)
                    .map(|question| FormQuestion {
                        question_id: question.question_id.unwrap_or_else(|| item_id.clone()),
                        grading: question.grading.map(|grading| Grading {
                            point_value: grading.point_value,
                            correct_answers: grading
                                .correct_answers
                                .map(|correct| {
                                    correct
                                        .answers
                                        .into_iter()
                                        .filter_map(|answer| answer.value)
                                        .collect()
                                })
                                .unwrap_or_default(),
                        }),
                    });
                FormItem { item_id, question }
            })
            .collect();
        FormDefinition { items }
    }
}
