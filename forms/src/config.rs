use crate::definition::FormDefinition;
use crate::mapping::ErrorResponseMapping;
use crate::submission::SubmitHandler;
use crate::Result;
use fields::FieldSchema;
use std::fmt;
use std::sync::Arc;

/// Side effect run when the form is closed, by cancel or by a successful submit
pub type CloseHook = Arc<dyn Fn() + Send + Sync>;

/// Configuration of one form
#[derive(Clone)]
pub struct FormConfig {
    pub schema: Arc<FieldSchema>,
    pub submit_handler: Arc<dyn SubmitHandler>,
    pub error_response_mapping: Option<ErrorResponseMapping>,
    pub cancel_confirmation_disabled: bool,
    pub loading_disabled: bool,
    pub on_close: Option<CloseHook>,
}

impl FormConfig {
    pub fn new(schema: FieldSchema, submit_handler: impl SubmitHandler + 'static) -> Self {
        Self {
            schema: Arc::new(schema),
            submit_handler: Arc::new(submit_handler),
            error_response_mapping: None,
            cancel_confirmation_disabled: false,
            loading_disabled: false,
            on_close: None,
        }
    }

    /// Build a configuration from a loaded form definition
    pub fn from_definition(
        definition: FormDefinition,
        submit_handler: impl SubmitHandler + 'static,
    ) -> Result<Self> {
        let schema = FieldSchema::new(definition.fields)?;
        Ok(Self {
            error_response_mapping: definition.error_response_mapping,
            cancel_confirmation_disabled: definition.cancel_confirmation_disabled,
            loading_disabled: definition.loading_disabled,
            ..Self::new(schema, submit_handler)
        })
    }

    pub fn with_error_response_mapping(mut self, mapping: ErrorResponseMapping) -> Self {
        self.error_response_mapping = Some(mapping);
        self
    }

    pub fn cancel_confirmation_disabled(mut self, disabled: bool) -> Self {
        self.cancel_confirmation_disabled = disabled;
        self
    }

    pub fn loading_disabled(mut self, disabled: bool) -> Self {
        self.loading_disabled = disabled;
        self
    }

    pub fn on_close<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("schema", &self.schema)
            .field("error_response_mapping", &self.error_response_mapping)
            .field(
                "cancel_confirmation_disabled",
                &self.cancel_confirmation_disabled,
            )
            .field("loading_disabled", &self.loading_disabled)
            .field("on_close", &self.on_close.is_some())
            .finish_non_exhaustive()
    }
}
