//! UI string registry keyed by (locale, key).
//!
//! Lookups fall back to English, then to the key itself.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::domain::locale::Locale;

type Table = &'static [(&'static str, &'static str)];

const EN: Table = &[
    ("nav.home", "Home"),
    ("nav.services", "Services"),
    ("nav.about", "About"),
    ("nav.blog", "Blog"),
    ("nav.contact", "Contact"),
    ("nav.privacy", "Privacy"),
    ("nav.language", "Language"),
    ("footer.tagline", "Engineering partners for cloud, data and the web."),
    ("footer.rights", "All rights reserved."),
    ("cookie.message", "We use cookies for anonymous analytics. You can accept or decline them."),
    ("cookie.accept", "Accept"),
    ("cookie.reject", "Decline"),
    ("cookie.learn_more", "Privacy policy"),
    ("home.title", ""),
    ("home.description", "Meridian Systems builds dependable cloud platforms, data pipelines and web products for teams across Europe, Japan and the Middle East."),
    ("home.hero_title", "Software that keeps your business moving"),
    ("home.hero_subtitle", "We design, build and operate systems that scale with you, from the first prototype to millions of users."),
    ("home.cta_contact", "Talk to us"),
    ("home.cta_services", "Explore services"),
    ("home.highlights_title", "What we do"),
    ("home.latest_title", "Latest from the blog"),
    ("home.view_all", "View all articles"),
    ("services.title", "Services"),
    ("services.description", "Cloud architecture, data engineering, security reviews, web development and long-term support."),
    ("services.intro", "Every engagement starts with a short discovery phase. We then agree on a plan with clear milestones and costs."),
    ("service.cloud.title", "Cloud architecture"),
    ("service.cloud.body", "Migrations, cost reviews and platform design on AWS, Azure and Google Cloud."),
    ("service.data.title", "Data engineering"),
    ("service.data.body", "Reliable pipelines, warehouses and dashboards your analysts can trust."),
    ("service.security.title", "Security reviews"),
    ("service.security.body", "Threat modelling, code audits and hardening of existing infrastructure."),
    ("service.web.title", "Web products"),
    ("service.web.body", "Fast, accessible websites and applications in every language your customers speak."),
    ("service.ai.title", "Applied machine learning"),
    ("service.ai.body", "Search, recommendation and document processing built on proven models."),
    ("service.support.title", "Operations & support"),
    ("service.support.body", "On-call coverage, monitoring and incident response with agreed response times."),
    ("about.title", "About us"),
    ("about.description", "A small senior team of engineers working from Lisbon, Tokyo and Dubai."),
    ("about.lead", "Meridian Systems was founded by engineers who wanted to build software the way they would like to use it: carefully, openly and for the long term."),
    ("about.body", "Our team works across three time zones, which lets us support clients around the clock and in their own language."),
    ("about.values_title", "How we work"),
    ("about.value.quality", "Quality first: tests, reviews and documentation are part of every delivery."),
    ("about.value.transparency", "Transparency: you always know what we are working on and why."),
    ("about.value.partnership", "Partnership: we measure success by your results, not by hours billed."),
    ("privacy.title", "Privacy policy"),
    ("privacy.description", "How Meridian Systems handles personal data on this website."),
    ("privacy.collect_title", "What we collect"),
    ("privacy.collect_body", "When you use the contact form we store your name, email address, company and message so we can reply to you."),
    ("privacy.cookies_title", "Cookies"),
    ("privacy.cookies_body", "We remember your cookie choice in a cookie called cookie_consent. Analytics cookies are only set after you accept them."),
    ("privacy.rights_title", "Your rights"),
    ("privacy.rights_body", "You can ask us to show, correct or delete your data at any time through the contact form."),
    ("blog.title", "Blog"),
    ("blog.description", "Notes on cloud, data and software engineering from the Meridian team."),
    ("blog.all_tags", "All topics"),
    ("blog.empty", "No articles yet. Please check back soon."),
    ("blog.previous", "Newer"),
    ("blog.next", "Older"),
    ("blog.page", "Page"),
    ("blog.minutes", "min read"),
    ("blog.by", "By"),
    ("blog.back", "Back to all articles"),
    ("blog.fallback_notice", "This article is not available in your language yet. It is shown in its original language."),
    ("blog.other_languages", "Also available in"),
    ("contact.title", "Contact"),
    ("contact.description", "Tell us about your project and we will get back to you within two business days."),
    ("contact.intro", "Tell us about your project. We usually reply within two business days."),
    ("contact.name", "Name"),
    ("contact.email", "Email"),
    ("contact.company", "Company (optional)"),
    ("contact.message", "Message"),
    ("contact.website", "Leave this field empty"),
    ("contact.submit", "Send message"),
    ("contact.success", "Thank you. Your message has been received."),
    ("contact.unavailable", "The contact form is currently unavailable. Please try again later."),
    ("contact.failed", "Your message could not be sent. Please try again later."),
    ("contact.captcha_unavailable", "We could not verify that you are human right now. Please try again in a few minutes."),
    ("contact.rate_limited", "You have sent several messages in a short time. Please wait a while before trying again."),
    ("contact.error.name_required", "Please enter your name."),
    ("contact.error.name_invalid", "Please enter a name of at most 100 characters."),
    ("contact.error.email_required", "Please enter your email address."),
    ("contact.error.email_invalid", "Please enter a valid email address."),
    ("contact.error.company_too_long", "Company names can be at most 120 characters."),
    ("contact.error.message_too_short", "Please write at least 10 characters."),
    ("contact.error.message_too_long", "Messages can be at most 5000 characters."),
    ("contact.error.captcha_missing", "Please complete the verification."),
    ("contact.error.captcha_failed", "The verification failed. Please try again."),
    ("error.not_found_title", "Page not found"),
    ("error.not_found_body", "The page you are looking for does not exist or has moved."),
    ("error.server_title", "Something went wrong"),
    ("error.server_body", "We could not complete your request. Please try again later."),
    ("error.home_link", "Go to the home page"),
];

const JA: Table = &[
    ("nav.home", "ホーム"),
    ("nav.services", "サービス"),
    ("nav.about", "会社概要"),
    ("nav.blog", "ブログ"),
    ("nav.contact", "お問い合わせ"),
    ("nav.privacy", "プライバシー"),
    ("nav.language", "言語"),
    ("footer.tagline", "クラウド、データ、ウェブのエンジニアリングパートナー。"),
    ("footer.rights", "無断転載を禁じます。"),
    ("cookie.message", "匿名のアクセス解析のために Cookie を使用しています。同意または拒否を選択できます。"),
    ("cookie.accept", "同意する"),
    ("cookie.reject", "拒否する"),
    ("cookie.learn_more", "プライバシーポリシー"),
    ("home.description", "Meridian Systems は、ヨーロッパ、日本、中東のチームのために信頼性の高いクラウド基盤、データパイプライン、ウェブプロダクトを構築しています。"),
    ("home.hero_title", "ビジネスを止めないソフトウェアを"),
    ("home.hero_subtitle", "最初のプロトタイプから数百万人規模のサービスまで、成長に合わせて拡張できるシステムを設計・構築・運用します。"),
    ("home.cta_contact", "相談する"),
    ("home.cta_services", "サービスを見る"),
    ("home.highlights_title", "私たちの仕事"),
    ("home.latest_title", "ブログの最新記事"),
    ("home.view_all", "すべての記事を見る"),
    ("services.title", "サービス"),
    ("services.description", "クラウドアーキテクチャ、データエンジニアリング、セキュリティ診断、ウェブ開発、長期サポート。"),
    ("services.intro", "すべてのプロジェクトは短いヒアリングから始まります。その後、マイルストーンと費用を明確にした計画をご提案します。"),
    ("service.cloud.title", "クラウドアーキテクチャ"),
    ("service.cloud.body", "AWS、Azure、Google Cloud での移行、コスト見直し、基盤設計。"),
    ("service.data.title", "データエンジニアリング"),
    ("service.data.body", "分析担当者が信頼できるパイプライン、データウェアハウス、ダッシュボード。"),
    ("service.security.title", "セキュリティ診断"),
    ("service.security.body", "脅威モデリング、コード監査、既存インフラの堅牢化。"),
    ("service.web.title", "ウェブプロダクト"),
    ("service.web.body", "お客様の言語に対応した、高速でアクセシブルなウェブサイトとアプリケーション。"),
    ("service.ai.title", "機械学習の活用"),
    ("service.ai.body", "実績あるモデルを用いた検索、レコメンド、文書処理。"),
    ("service.support.title", "運用・サポート"),
    ("service.support.body", "合意した応答時間でのオンコール対応、監視、障害対応。"),
    ("about.title", "会社概要"),
    ("about.description", "リスボン、東京、ドバイを拠点とする少数精鋭のエンジニアチームです。"),
    ("about.lead", "Meridian Systems は、自分たちが使いたいと思えるソフトウェアを丁寧に、オープンに、長く使えるように作りたいと考えたエンジニアによって設立されました。"),
    ("about.body", "3つのタイムゾーンにまたがるチームにより、24時間体制かつお客様の言語でサポートできます。"),
    ("about.values_title", "私たちの働き方"),
    ("about.value.quality", "品質第一：テスト、レビュー、ドキュメントはすべての納品物に含まれます。"),
    ("about.value.transparency", "透明性：何に取り組んでいるのか、その理由を常に共有します。"),
    ("about.value.partnership", "パートナーシップ：成果は請求時間ではなく、お客様の結果で測ります。"),
    ("privacy.title", "プライバシーポリシー"),
    ("privacy.description", "本ウェブサイトにおける Meridian Systems の個人情報の取り扱いについて。"),
    ("privacy.collect_title", "収集する情報"),
    ("privacy.collect_body", "お問い合わせフォームをご利用の際、返信のためにお名前、メールアドレス、会社名、メッセージを保存します。"),
    ("privacy.cookies_title", "Cookie について"),
    ("privacy.cookies_body", "Cookie の選択内容は cookie_consent という Cookie に保存されます。アクセス解析用の Cookie は同意後にのみ設定されます。"),
    ("privacy.rights_title", "お客様の権利"),
    ("privacy.rights_body", "お問い合わせフォームから、いつでもご自身のデータの開示、訂正、削除を依頼できます。"),
    ("blog.title", "ブログ"),
    ("blog.description", "Meridian チームによるクラウド、データ、ソフトウェア開発に関する記事。"),
    ("blog.all_tags", "すべてのトピック"),
    ("blog.empty", "まだ記事がありません。"),
    ("blog.previous", "新しい記事"),
    ("blog.next", "過去の記事"),
    ("blog.page", "ページ"),
    ("blog.minutes", "分で読めます"),
    ("blog.by", "著者"),
    ("blog.back", "記事一覧に戻る"),
    ("blog.fallback_notice", "この記事はまだ日本語に翻訳されていません。原文の言語で表示しています。"),
    ("blog.other_languages", "他の言語で読む"),
    ("contact.title", "お問い合わせ"),
    ("contact.description", "プロジェクトについてお聞かせください。2営業日以内にご連絡いたします。"),
    ("contact.intro", "プロジェクトについてお聞かせください。通常2営業日以内に返信いたします。"),
    ("contact.name", "お名前"),
    ("contact.email", "メールアドレス"),
    ("contact.company", "会社名（任意）"),
    ("contact.message", "メッセージ"),
    ("contact.website", "この欄は空欄のままにしてください"),
    ("contact.submit", "送信する"),
    ("contact.success", "お問い合わせありがとうございます。メッセージを受け付けました。"),
    ("contact.unavailable", "現在お問い合わせフォームはご利用いただけません。後ほどお試しください。"),
    ("contact.failed", "メッセージを送信できませんでした。後ほどお試しください。"),
    ("contact.captcha_unavailable", "現在、認証を確認できません。数分後にもう一度お試しください。"),
    ("contact.rate_limited", "短時間に複数のメッセージが送信されました。しばらくしてからお試しください。"),
    ("contact.error.name_required", "お名前を入力してください。"),
    ("contact.error.name_invalid", "お名前は100文字以内で入力してください。"),
    ("contact.error.email_required", "メールアドレスを入力してください。"),
    ("contact.error.email_invalid", "有効なメールアドレスを入力してください。"),
    ("contact.error.company_too_long", "会社名は120文字以内で入力してください。"),
    ("contact.error.message_too_short", "メッセージは10文字以上で入力してください。"),
    ("contact.error.message_too_long", "メッセージは5000文字以内で入力してください。"),
    ("contact.error.captcha_missing", "認証を完了してください。"),
    ("contact.error.captcha_failed", "認証に失敗しました。もう一度お試しください。"),
    ("error.not_found_title", "ページが見つかりません"),
    ("error.not_found_body", "お探しのページは存在しないか、移動しました。"),
    ("error.server_title", "エラーが発生しました"),
    ("error.server_body", "リクエストを完了できませんでした。後ほどお試しください。"),
    ("error.home_link", "ホームに戻る"),
];

const AR: Table = &[
    ("nav.home", "الرئيسية"),
    ("nav.services", "الخدمات"),
    ("nav.about", "من نحن"),
    ("nav.blog", "المدونة"),
    ("nav.contact", "اتصل بنا"),
    ("nav.privacy", "الخصوصية"),
    ("nav.language", "اللغة"),
    ("footer.tagline", "شركاؤك الهندسيون في السحابة والبيانات والويب."),
    ("footer.rights", "جميع الحقوق محفوظة."),
    ("cookie.message", "نستخدم ملفات تعريف الارتباط لتحليلات مجهولة الهوية. يمكنك قبولها أو رفضها."),
    ("cookie.accept", "قبول"),
    ("cookie.reject", "رفض"),
    ("cookie.learn_more", "سياسة الخصوصية"),
    ("home.description", "تبني Meridian Systems منصات سحابية موثوقة وخطوط بيانات ومنتجات ويب لفرق في أوروبا واليابان والشرق الأوسط."),
    ("home.hero_title", "برمجيات تبقي أعمالك في حركة دائمة"),
    ("home.hero_subtitle", "نصمم ونبني ونشغّل أنظمة تنمو معك، من النموذج الأولي الأول إلى ملايين المستخدمين."),
    ("home.cta_contact", "تحدث إلينا"),
    ("home.cta_services", "استكشف خدماتنا"),
    ("home.highlights_title", "ماذا نقدم"),
    ("home.latest_title", "أحدث المقالات"),
    ("home.view_all", "عرض جميع المقالات"),
    ("services.title", "الخدمات"),
    ("services.description", "هندسة السحابة وهندسة البيانات ومراجعات الأمان وتطوير الويب والدعم طويل الأمد."),
    ("services.intro", "يبدأ كل تعاون بمرحلة استكشاف قصيرة، ثم نتفق على خطة بمراحل وتكاليف واضحة."),
    ("service.cloud.title", "هندسة السحابة"),
    ("service.cloud.body", "الترحيل ومراجعة التكاليف وتصميم المنصات على AWS وAzure وGoogle Cloud."),
    ("service.data.title", "هندسة البيانات"),
    ("service.data.body", "خطوط بيانات ومستودعات ولوحات معلومات موثوقة يعتمد عليها المحللون."),
    ("service.security.title", "مراجعات الأمان"),
    ("service.security.body", "نمذجة التهديدات وتدقيق الشيفرة وتقوية البنية التحتية القائمة."),
    ("service.web.title", "منتجات الويب"),
    ("service.web.body", "مواقع وتطبيقات سريعة وسهلة الوصول بكل لغة يتحدث بها عملاؤك."),
    ("service.ai.title", "تعلم الآلة التطبيقي"),
    ("service.ai.body", "البحث والتوصيات ومعالجة المستندات باستخدام نماذج مجرّبة."),
    ("service.support.title", "التشغيل والدعم"),
    ("service.support.body", "مناوبة ومراقبة واستجابة للحوادث وفق أوقات استجابة متفق عليها."),
    ("about.title", "من نحن"),
    ("about.description", "فريق صغير من المهندسين ذوي الخبرة يعمل من لشبونة وطوكيو ودبي."),
    ("about.lead", "أسس مهندسون شركة Meridian Systems لبناء برمجيات كما يحبون استخدامها: بعناية وانفتاح وعلى المدى الطويل."),
    ("about.body", "يعمل فريقنا عبر ثلاث مناطق زمنية، مما يتيح لنا دعم عملائنا على مدار الساعة وبلغتهم."),
    ("about.values_title", "طريقتنا في العمل"),
    ("about.value.quality", "الجودة أولاً: الاختبارات والمراجعات والتوثيق جزء من كل تسليم."),
    ("about.value.transparency", "الشفافية: تعرف دائماً ما نعمل عليه ولماذا."),
    ("about.value.partnership", "الشراكة: نقيس نجاحنا بنتائجك لا بعدد الساعات."),
    ("privacy.title", "سياسة الخصوصية"),
    ("privacy.description", "كيف تتعامل Meridian Systems مع البيانات الشخصية على هذا الموقع."),
    ("privacy.collect_title", "ما نجمعه"),
    ("privacy.collect_body", "عند استخدام نموذج الاتصال نحفظ اسمك وبريدك الإلكتروني وشركتك ورسالتك لنتمكن من الرد عليك."),
    ("privacy.cookies_title", "ملفات تعريف الارتباط"),
    ("privacy.cookies_body", "نحفظ اختيارك في ملف تعريف ارتباط باسم cookie_consent. لا تُضبط ملفات التحليلات إلا بعد موافقتك."),
    ("privacy.rights_title", "حقوقك"),
    ("privacy.rights_body", "يمكنك أن تطلب منا في أي وقت عرض بياناتك أو تصحيحها أو حذفها عبر نموذج الاتصال."),
    ("blog.title", "المدونة"),
    ("blog.description", "ملاحظات فريق Meridian حول السحابة والبيانات وهندسة البرمجيات."),
    ("blog.all_tags", "جميع المواضيع"),
    ("blog.empty", "لا توجد مقالات بعد."),
    ("blog.previous", "الأحدث"),
    ("blog.next", "الأقدم"),
    ("blog.page", "صفحة"),
    ("blog.minutes", "دقائق للقراءة"),
    ("blog.by", "بقلم"),
    ("blog.back", "العودة إلى جميع المقالات"),
    ("blog.fallback_notice", "هذه المقالة غير متوفرة بالعربية بعد، لذلك تُعرض بلغتها الأصلية."),
    ("blog.other_languages", "متوفرة أيضاً بـ"),
    ("contact.title", "اتصل بنا"),
    ("contact.description", "أخبرنا عن مشروعك وسنعود إليك خلال يومي عمل."),
    ("contact.intro", "أخبرنا عن مشروعك. نرد عادةً خلال يومي عمل."),
    ("contact.name", "الاسم"),
    ("contact.email", "البريد الإلكتروني"),
    ("contact.company", "الشركة (اختياري)"),
    ("contact.message", "الرسالة"),
    ("contact.website", "اترك هذا الحقل فارغاً"),
    ("contact.submit", "إرسال الرسالة"),
    ("contact.success", "شكراً لك. تم استلام رسالتك."),
    ("contact.unavailable", "نموذج الاتصال غير متاح حالياً. يرجى المحاولة لاحقاً."),
    ("contact.failed", "تعذر إرسال رسالتك. يرجى المحاولة لاحقاً."),
    ("contact.captcha_unavailable", "لا يمكننا التحقق الآن. يرجى المحاولة بعد بضع دقائق."),
    ("contact.rate_limited", "أرسلت عدة رسائل خلال وقت قصير. يرجى الانتظار قليلاً ثم المحاولة مجدداً."),
    ("contact.error.name_required", "يرجى إدخال اسمك."),
    ("contact.error.name_invalid", "يرجى إدخال اسم لا يتجاوز 100 حرف."),
    ("contact.error.email_required", "يرجى إدخال بريدك الإلكتروني."),
    ("contact.error.email_invalid", "يرجى إدخال بريد إلكتروني صالح."),
    ("contact.error.company_too_long", "يجب ألا يتجاوز اسم الشركة 120 حرفاً."),
    ("contact.error.message_too_short", "يرجى كتابة 10 أحرف على الأقل."),
    ("contact.error.message_too_long", "يجب ألا تتجاوز الرسالة 5000 حرف."),
    ("contact.error.captcha_missing", "يرجى إكمال التحقق."),
    ("contact.error.captcha_failed", "فشل التحقق. يرجى المحاولة مجدداً."),
    ("error.not_found_title", "الصفحة غير موجودة"),
    ("error.not_found_body", "الصفحة التي تبحث عنها غير موجودة أو تم نقلها."),
    ("error.server_title", "حدث خطأ ما"),
    ("error.server_body", "تعذر إكمال طلبك. يرجى المحاولة لاحقاً."),
    ("error.home_link", "الذهاب إلى الصفحة الرئيسية"),
];

static REGISTRY: Lazy<HashMap<Locale, HashMap<&'static str, &'static str>>> = Lazy::new(|| {
    [(Locale::En, EN), (Locale::Ja, JA), (Locale::Ar, AR)]
        .into_iter()
        .map(|(locale, table)| (locale, table.iter().copied().collect()))
        .collect()
});

/// Translate `key` for `locale`.
pub fn t<'a>(locale: Locale, key: &'a str) -> &'a str {
    let lookup = |locale: Locale| {
        REGISTRY
            .get(&locale)
            .and_then(|table| table.get(key))
            .copied()
    };
    lookup(locale).or_else(|| lookup(Locale::En)).unwrap_or(key)
}
