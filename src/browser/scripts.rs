//! In-page scripts run through WebDriver.
//!
//! Each script only collects raw facts (attributes, computed style strings,
//! layout flags). Filtering and shaping happen in the extractors.

/// Computed-style probe shared by the content snapshot.
const PROBE: &str = r#"
const probe = (el) => {
    const style = window.getComputedStyle(el);
    return {
        display: style.display,
        visibility: style.visibility,
        opacity: style.opacity,
        inLayout: el.offsetParent !== null
    };
};
const text = (el) => el.innerText || '';
const all = (selector, root) => Array.from((root || document).querySelectorAll(selector));
"#;

const CONTENT_BODY: &str = r#"
return {
    headings: all('h1, h2, h3, h4, h5, h6').map(el => ({
        tag: el.tagName.toLowerCase(),
        text: text(el),
        style: probe(el)
    })),
    paragraphs: all('p').map(el => ({
        text: text(el),
        style: probe(el)
    })),
    lists: all('ul, ol').map(el => ({
        tag: el.tagName.toLowerCase(),
        style: probe(el),
        items: all('li', el).map(li => ({ text: text(li), style: probe(li) }))
    })),
    navigation: all('nav a, header a, [role="navigation"] a').map(el => ({
        text: text(el),
        href: el.getAttribute('href'),
        style: probe(el)
    })),
    sections: all('section, article, main, aside, header, footer').map(el => ({
        tag: el.tagName.toLowerCase(),
        id: el.id || null,
        className: typeof el.className === 'string' ? el.className : null,
        style: probe(el),
        headings: all('h1, h2, h3, h4, h5, h6', el).map(h => ({ text: text(h), style: probe(h) }))
    }))
};
"#;

const ASSETS: &str = r#"
const positive = (n) => (typeof n === 'number' && n > 0) ? Math.round(n) : null;
return {
    images: Array.from(document.querySelectorAll('img')).map(img => ({
        src: img.getAttribute('src'),
        dataSrc: img.getAttribute('data-src'),
        srcset: img.getAttribute('srcset'),
        alt: img.getAttribute('alt'),
        width: positive(img.naturalWidth) || positive(img.width),
        height: positive(img.naturalHeight) || positive(img.height)
    })),
    backgrounds: Array.from(document.querySelectorAll('*'))
        .map(el => ({
            tag: el.tagName.toLowerCase(),
            backgroundImage: window.getComputedStyle(el).backgroundImage
        }))
        .filter(bg => bg.backgroundImage && bg.backgroundImage !== 'none'),
    svgs: Array.from(document.querySelectorAll('svg')).map(svg => ({
        markup: svg.outerHTML,
        width: svg.getAttribute('width'),
        height: svg.getAttribute('height')
    }))
};
"#;

const TOKENS: &str = r#"
const rootStyle = window.getComputedStyle(document.documentElement);
const variables = [];
for (let i = 0; i < rootStyle.length; i++) {
    const prop = rootStyle[i];
    if (prop.startsWith('--')) {
        variables.push([prop, rootStyle.getPropertyValue(prop).trim()]);
    }
}

const sampled = [
    ...document.querySelectorAll('h1, h2, h3, h4, h5, h6'),
    ...document.querySelectorAll('p'),
    ...document.querySelectorAll('a'),
    ...document.querySelectorAll('button'),
    ...document.querySelectorAll('[class*="button"]'),
    ...document.querySelectorAll('[class*="btn"]'),
    document.body,
    document.querySelector('header'),
    document.querySelector('nav'),
    document.querySelector('footer')
].filter(Boolean);

const samples = sampled.map(el => {
    const style = window.getComputedStyle(el);
    return {
        tag: el.tagName.toLowerCase(),
        className: typeof el.className === 'string' ? el.className : '',
        color: style.color,
        backgroundColor: style.backgroundColor,
        borderColor: style.borderColor,
        fontFamily: style.fontFamily,
        fontSize: style.fontSize,
        fontWeight: style.fontWeight
    };
});

const spacing = Array.from(document.querySelectorAll(
    'section, div[class*="container"], div[class*="wrapper"]'
)).map(el => {
    const style = window.getComputedStyle(el);
    return { padding: style.padding, margin: style.margin, gap: style.gap };
});

return { variables: variables, samples: samples, spacing: spacing };
"#;

// The resource timing buffer holds 250 entries by default and silently drops
// later ones, so the first probe enlarges it and installs an observer, which
// is not bounded by the buffer.
const NETWORK_PROBE: &str = r#"
const RESOURCE_BUFFER = 100000;
if (!window.__harvestNetwork) {
    window.__harvestNetwork = { observed: 0 };
    performance.setResourceTimingBufferSize(RESOURCE_BUFFER);
    performance.addEventListener('resourcetimingbufferfull', () => {
        performance.setResourceTimingBufferSize(
            performance.getEntriesByType('resource').length + RESOURCE_BUFFER
        );
    });
    if (typeof PerformanceObserver !== 'undefined') {
        new PerformanceObserver((list) => {
            window.__harvestNetwork.observed += list.getEntries().length;
        }).observe({ type: 'resource', buffered: true });
    }
}
return {
    readyState: document.readyState,
    resources: Math.max(
        window.__harvestNetwork.observed,
        performance.getEntriesByType('resource').length
    )
};
"#;

const AUTO_SCROLL: &str = r#"
const step = arguments[0];
const interval = arguments[1];
const maxSteps = arguments[2];
const done = arguments[arguments.length - 1];
let travelled = 0;
let steps = 0;
const timer = setInterval(() => {
    window.scrollBy(0, step);
    travelled += step;
    steps += 1;
    const root = document.body || document.documentElement;
    if (travelled >= root.scrollHeight || steps >= maxSteps) {
        clearInterval(timer);
        done(steps);
    }
}, interval);
"#;

const SCROLL_TOP: &str = r#"
window.scrollTo(0, 0);
return true;
"#;

/// Identifier of an in-page script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Visibility-annotated headings, paragraphs, lists, nav links and sections
    Content,
    /// Image attributes, computed backgrounds and inline SVG markup
    Assets,
    /// Root custom properties and computed styles of sampled elements
    Tokens,
    /// Document ready state and resource timing count
    NetworkProbe,
    /// Step-wise scroll to the bottom; args: step px, interval ms, max steps
    AutoScroll,
    ScrollTop,
}

impl Script {
    pub fn name(&self) -> &'static str {
        match self {
            Script::Content => "content",
            Script::Assets => "assets",
            Script::Tokens => "tokens",
            Script::NetworkProbe => "network-probe",
            Script::AutoScroll => "auto-scroll",
            Script::ScrollTop => "scroll-top",
        }
    }

    /// Scripts that finish through the WebDriver async callback
    pub fn is_async(&self) -> bool {
        matches!(self, Script::AutoScroll)
    }

    /// Function body handed to WebDriver
    pub fn source(&self) -> String {
        match self {
            Script::Content => format!("{PROBE}{CONTENT_BODY}"),
            Script::Assets => ASSETS.to_string(),
            Script::Tokens => TOKENS.to_string(),
            Script::NetworkProbe => NETWORK_PROBE.to_string(),
            Script::AutoScroll => AUTO_SCROLL.to_string(),
            Script::ScrollTop => SCROLL_TOP.to_string(),
        }
    }
}
