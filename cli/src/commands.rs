//! Non-interactive subcommands. Each returns the text to print so it can be tested without a
//! terminal.

use std::sync::Arc;

use anyhow::Context;
use studio_protocol::MessageTemplate;
use studio_protocol::TemplateId;
use studio_protocol::TenantId;
use studio_protocol::ordering::move_by_id;
use studio_protocol::preview::LinkResolver;
use studio_protocol::preview::resolve_text;
use studio_protocol::segment::Segment;
use studio_protocol::segment::Token;
use studio_protocol::segment::append_token_to_canonical;
use studio_protocol::segment::is_portfolio_slug;
use studio_protocol::segment::is_variable_key;
use studio_protocol::store::MessageSink;
use studio_protocol::store::OutgoingMessage;
use studio_protocol::store::ShortLinkProvider;
use studio_protocol::store::TemplateStore;
use studio_protocol::variables::VariableBindings;

/// Collaborators shared by every command for one tenant.
pub struct Studio {
    pub tenant: TenantId,
    pub store: Arc<dyn TemplateStore>,
    pub short_links: Arc<dyn ShortLinkProvider>,
    pub sink: Arc<dyn MessageSink>,
    pub links: LinkResolver,
}

/// Chips appended to a message created from the command line.
#[derive(Debug, Default)]
pub struct TokenArgs {
    pub variables: Vec<String>,
    pub portfolio: Option<String>,
}

impl Studio {
    pub fn list(&self) -> anyhow::Result<String> {
        let templates = self.templates()?;
        if templates.is_empty() {
            return Ok(format!("No templates for {} yet.\n", self.tenant));
        }
        let mut out = String::new();
        for template in &templates {
            out.push_str(&format!(
                "{}. {}  [{}]\n",
                template.order + 1,
                template.title,
                template.id
            ));
            for line in template.message.lines() {
                out.push_str(&format!("   {line}\n"));
            }
        }
        Ok(out)
    }

    pub fn add(&self, title: &str, message: &str, tokens: &TokenArgs) -> anyhow::Result<String> {
        let message = append_tokens(message, tokens)?;
        let template = self
            .store
            .create(&self.tenant, title, &message)
            .context("create template")?;
        Ok(format!("Created {} ({})\n", template.title, template.id))
    }

    pub fn edit(
        &self,
        id: TemplateId,
        title: Option<&str>,
        message: Option<&str>,
    ) -> anyhow::Result<String> {
        let current = self.find(id)?;
        let template = self
            .store
            .update(
                &self.tenant,
                &id,
                title.unwrap_or(&current.title),
                message.unwrap_or(&current.message),
            )
            .context("update template")?;
        Ok(format!("Updated {} ({})\n", template.title, template.id))
    }

    pub fn delete(&self, id: TemplateId) -> anyhow::Result<String> {
        let template = self.find(id)?;
        self.store
            .delete(&self.tenant, &id)
            .context("delete template")?;
        Ok(format!("Deleted {} ({id})\n", template.title))
    }

    /// Move `id` to the zero-based position `to` (clamped to the list) and persist the order.
    pub fn move_to(&self, id: TemplateId, to: usize) -> anyhow::Result<String> {
        let mut templates = self.templates()?;
        let Some(target) = templates
            .get(to.min(templates.len().saturating_sub(1)))
            .map(|template| template.id)
        else {
            anyhow::bail!("template {id} not found");
        };
        if !templates.iter().any(|template| template.id == id) {
            anyhow::bail!("template {id} not found");
        }
        if move_by_id(&mut templates, &id, &target) {
            let ordered_ids: Vec<TemplateId> =
                templates.iter().map(|template| template.id).collect();
            self.store
                .reorder(&self.tenant, &ordered_ids)
                .context("persist template order")?;
        }
        self.list()
    }

    pub fn preview(&self, id: TemplateId, bindings: &VariableBindings) -> anyhow::Result<String> {
        let template = self.find(id)?;
        let links = self.links_for(&template);
        let mut text = resolve_text(&template.message, bindings, &links);
        text.push('\n');
        Ok(text)
    }

    pub fn send(
        &self,
        id: TemplateId,
        bindings: &VariableBindings,
        phone: Option<&str>,
    ) -> anyhow::Result<String> {
        let template = self.find(id)?;
        let links = self.links_for(&template);
        self.send_text(
            Some(template.id),
            resolve_text(&template.message, bindings, &links),
            phone,
        )
    }

    /// Hand already resolved text to the send collaborator.
    pub fn send_text(
        &self,
        template_id: Option<TemplateId>,
        text: String,
        phone: Option<&str>,
    ) -> anyhow::Result<String> {
        let receipt = self
            .sink
            .send(&OutgoingMessage {
                tenant: self.tenant.clone(),
                template_id,
                recipient: phone.map(str::to_string),
                text: text.clone(),
            })
            .context("send message")?;
        let mut out = format!("{text}\n");
        if let Some(link) = receipt.deep_link {
            out.push_str(&format!("\nOpen in WhatsApp: {link}\n"));
        }
        Ok(out)
    }

    fn templates(&self) -> anyhow::Result<Vec<MessageTemplate>> {
        self.store.list(&self.tenant).context("load templates")
    }

    fn find(&self, id: TemplateId) -> anyhow::Result<MessageTemplate> {
        self.templates()?
            .into_iter()
            .find(|template| template.id == id)
            .with_context(|| format!("template {id} not found"))
    }

    /// The configured link resolver plus short codes for every portfolio in `template`. A failed
    /// lookup falls back to the slug URL.
    fn links_for(&self, template: &MessageTemplate) -> LinkResolver {
        let mut links = self.links.clone();
        for segment in template.segments() {
            let Segment::PortfolioLink { slug } = segment else {
                continue;
            };
            match self
                .short_links
                .get_or_create_short_link(&self.tenant, &slug)
            {
                Ok(link) => links.insert_short_code(link.slug, link.code),
                Err(err) => tracing::warn!("short link lookup for {slug} failed: {err}"),
            }
        }
        links
    }
}

/// Append chips to a message without an editor, using the same spacing as the composer.
pub fn append_tokens(message: &str, tokens: &TokenArgs) -> anyhow::Result<String> {
    let mut message = message.to_string();
    for key in &tokens.variables {
        if !is_variable_key(key) {
            anyhow::bail!("invalid variable key `{key}`: use letters, digits and `_`");
        }
        message = append_token_to_canonical(&message, &Token::Variable(key.clone()));
    }
    if let Some(slug) = &tokens.portfolio {
        check_portfolio_slug(slug)?;
        message = append_token_to_canonical(&message, &Token::PortfolioLink(slug.clone()));
    }
    Ok(message)
}

/// Reject slugs that would not survive a save and reload as a portfolio chip.
pub fn check_portfolio_slug(slug: &str) -> anyhow::Result<()> {
    if !is_portfolio_slug(slug) {
        anyhow::bail!("invalid portfolio slug `{slug}`: no spaces or brackets allowed");
    }
    Ok(())
}
